// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for process-backed formatting engines.

use crate::engines::Engine;
use thiserror::Error;

/// Failures of the process backend adapters.
///
/// `Spawn` and `Process` carry enough context for the diagnostic log to be
/// actionable. The two `GoTool*` variants are reclassifications of specific
/// `go tool` stderr patterns into messages a user can act on; they take the
/// same control path as any other process failure.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The executable could not be started at all.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited non-zero.
    #[error("{engine} engine exited with code {exit_code}: {stderr}")]
    Process {
        engine: Engine,
        exit_code: i32,
        stderr: String,
    },

    /// `go tool` does not know the formatter; the module is not registered
    /// as a tool dependency of the current Go module.
    #[error(
        "the formatter is not registered as a go tool; add it to the tool \
         directive of your go.mod (go get -tool {module_path}): {stderr}"
    )]
    GoToolNotRegistered { module_path: String, stderr: String },

    /// The installed Go toolchain is too old for the tool mechanism or for
    /// the formatter module itself.
    #[error("the installed go toolchain cannot run the formatter tool (Go 1.24+ required): {stderr}")]
    GoToolchainOutdated { stderr: String },

    /// Writing stdin or collecting output failed mid-flight.
    #[error("i/o error talking to {engine} engine: {source}")]
    Io {
        engine: Engine,
        #[source]
        source: std::io::Error,
    },

    /// The engine produced bytes that are not valid UTF-8.
    #[error("{engine} engine produced non-UTF-8 output")]
    InvalidOutput { engine: Engine },
}
