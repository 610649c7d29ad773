// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Environment probing for candidate formatter executables.
//!
//! A probe answers one question: does this candidate respond to a version
//! query? It is used only to pick between invocation strategies; it never
//! validates formatting output. Probes are memoless and may be called on
//! every format request.

use std::path::Path;
use std::process::{Command, Stdio};

/// Version query subcommand understood by the formatter CLI.
pub const VERSION_QUERY: &str = "raw-version";

/// Checks whether a candidate executable is present and runnable.
///
/// Implementations must never fail: a missing binary, a permission error, or
/// a non-zero exit all collapse to `false`.
pub trait ExecProbe: Send + Sync {
    fn probe(&self, candidate: &Path) -> bool;
}

/// Probes by spawning `<candidate> raw-version` and checking for exit code
/// zero. Output is discarded; only the exit status matters.
#[derive(Debug, Default)]
pub struct VersionProbe;

impl ExecProbe for VersionProbe {
    fn probe(&self, candidate: &Path) -> bool {
        Command::new(candidate)
            .arg(VERSION_QUERY)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}
