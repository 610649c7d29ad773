// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for the in-process WASM engine.

use std::time::Duration;
use thiserror::Error;

/// Failures of the runtime bridge.
///
/// The two initialization variants are terminal for the process lifetime of
/// the bridge: once observed, every later `format()` call fails fast and
/// initialization is never retried automatically.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The module never signalled readiness within the allowed window.
    #[error("timeout waiting for WASM module initialization after {0:?}")]
    InitTimeout(Duration),

    /// Loading, validating, or instantiating the module failed.
    #[error("WASM engine initialization failed: {0}")]
    InitFailure(String),

    /// A format call arrived while the bridge is not `Ready`.
    #[error("WASM module not fully initialized")]
    NotReady,

    /// The module reported a structured error, or trapped mid-call.
    #[error("WASM formatting error: {0}")]
    ModuleFormat(String),

    /// The instantiated runtime exists but cannot be used for this call.
    #[error("WASM runtime unavailable: {0}")]
    Unavailable(String),

    /// Bootstrap shim manifest problems: unreadable, unparseable, wrong
    /// version, or an import the manifest does not cover.
    #[error("bootstrap shim error: {0}")]
    Shim(String),

    /// Invalid or unsupported module binary.
    #[error("invalid WASM binary: {0}")]
    InvalidBinary(String),

    /// File I/O while reading the shim or module artifacts.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the reverse execution bridge (§ host-side command execution
/// requested by the module). These are raised inside the module's call stack
/// and surface to format callers as [`BridgeError::ModuleFormat`].
#[derive(Error, Debug)]
pub enum ReverseExecError {
    #[error("empty command")]
    EmptyCommand,

    #[error("invalid virtual files payload: {0}")]
    InvalidVirtualFiles(#[from] serde_json::Error),

    #[error("virtual file name {0:?} escapes the scratch directory")]
    InvalidFileName(String),

    #[error("failed to materialize scratch directory: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("failed to write virtual file {name:?}: {source}")]
    WriteFile {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error talking to {program:?}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command {program:?} exited with code {exit_code}: {stderr}")]
    CommandFailed {
        program: String,
        exit_code: i32,
        stderr: String,
    },
}
