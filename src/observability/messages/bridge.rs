// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for WASM engine lifecycle events.

use std::fmt::{Display, Formatter};

/// WASM engine finished initializing and is ready for format calls.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use refmt_host::observability::messages::bridge::BridgeReady;
///
/// let msg = BridgeReady { elapsed_ms: 142 };
///
/// tracing::info!("{}", msg);
/// ```
pub struct BridgeReady {
    pub elapsed_ms: u64,
}

impl Display for BridgeReady {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "WASM engine ready after {} ms",
            self.elapsed_ms
        )
    }
}

/// WASM engine initialization failed. Terminal for this process: the
/// engine will not be retried.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use refmt_host::observability::messages::bridge::BridgeInitFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "refmt.wasm not found");
/// let msg = BridgeInitFailed { error: &error };
///
/// tracing::error!("{}", msg);
/// ```
pub struct BridgeInitFailed<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for BridgeInitFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "failed to initialize WASM engine: {}", self.error)
    }
}
