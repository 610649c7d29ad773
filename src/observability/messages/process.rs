// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for external process invocation events.

use std::fmt::{Display, Formatter};

/// An external formatter process is being spawned.
///
/// # Log Level
/// `debug!` - Routine per-request event
pub struct ProcessSpawned<'a> {
    pub engine: &'a str,
    pub program: &'a str,
}

impl Display for ProcessSpawned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}] spawning {}", self.engine, self.program)
    }
}

/// An external formatter process exited.
///
/// # Log Level
/// `debug!` - Routine per-request event
pub struct ProcessExited<'a> {
    pub engine: &'a str,
    pub program: &'a str,
    pub exit_code: i32,
}

impl Display for ProcessExited<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} exited with code {}",
            self.engine, self.program, self.exit_code
        )
    }
}
