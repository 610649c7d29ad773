// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for per-request routing and fallback decisions.

use std::fmt::{Display, Formatter};

/// A format attempt against the selected engine failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use refmt_host::observability::messages::dispatch::FormatFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "spawn failed");
/// let msg = FormatFailed {
///     engine: "path",
///     file_path: "main.tf",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct FormatFailed<'a> {
    pub engine: &'a str,
    pub file_path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for FormatFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] error formatting {}: {}",
            self.engine, self.file_path, self.error
        )
    }
}

/// The dispatcher is retrying a failed request against the WASM engine.
///
/// # Log Level
/// `info!` - Important operational event
pub struct FallbackEngaged<'a> {
    pub failed_engine: &'a str,
}

impl Display for FallbackEngaged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] engine failed, falling back to wasm",
            self.failed_engine
        )
    }
}

/// Fallback would have applied but is disabled by configuration.
///
/// # Log Level
/// `info!` - Important operational event
pub struct FallbackDisabled;

impl Display for FallbackDisabled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "wasm fallback disabled, returning no edits")
    }
}
