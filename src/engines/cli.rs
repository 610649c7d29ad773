// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Process backend adapter.
//!
//! All four process-backed engines share one adapter: they differ only in the
//! invocation prefix placed before the common `fmt --stdin` protocol. The
//! protocol is fixed: content on stdin, formatted text on stdout, diagnostics
//! on stderr, exit code zero for success.

use crate::engines::{Engine, FormatRequest, Formatter, GO_MODULE_PATH};
use crate::errors::{EngineError, FormatError};
use crate::observability::messages::process::{ProcessExited, ProcessSpawned};
use crate::probe::VERSION_QUERY;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// How to reach the formatter executable.
///
/// The toolchain variants delegate discovery (and, for `GoRun`, fetching) to
/// the Go toolchain; `Direct` invokes an already-resolved program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    GoTool {
        module_path: String,
    },
    GoRun {
        module_path: String,
        version: String,
    },
    Direct {
        program: PathBuf,
    },
}

impl Invocation {
    pub fn go_tool() -> Self {
        Invocation::GoTool {
            module_path: GO_MODULE_PATH.to_string(),
        }
    }

    /// Fetch-and-run pinned to the host crate version, so the external tool
    /// and the embedded WASM artifact stay in lockstep.
    pub fn go_run_at_host_version() -> Self {
        Invocation::GoRun {
            module_path: GO_MODULE_PATH.to_string(),
            version: format!("v{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn program(&self) -> OsString {
        match self {
            Invocation::GoTool { .. } | Invocation::GoRun { .. } => OsString::from("go"),
            Invocation::Direct { program } => program.clone().into_os_string(),
        }
    }

    pub fn prefix_args(&self) -> Vec<String> {
        match self {
            Invocation::GoTool { module_path } => {
                vec!["tool".to_string(), module_path.clone()]
            }
            Invocation::GoRun {
                module_path,
                version,
            } => vec!["run".to_string(), format!("{}@{}", module_path, version)],
            Invocation::Direct { .. } => Vec::new(),
        }
    }
}

/// Process-backed formatter for one resolved engine.
pub struct CliFormatter {
    engine: Engine,
    invocation: Invocation,
    version: Mutex<Option<String>>,
}

impl CliFormatter {
    pub fn new(engine: Engine, invocation: Invocation) -> Self {
        CliFormatter {
            engine,
            invocation,
            version: Mutex::new(None),
        }
    }

    fn format_args(&self, request: &FormatRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = self
            .invocation
            .prefix_args()
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push("fmt".into());
        args.push("--stdin".into());
        args.push("--format".into());
        args.push(request.format.as_str().into());
        args.push(request.file_path.as_os_str().to_os_string());
        args
    }

    async fn run(&self, args: Vec<OsString>, stdin_data: Option<&str>) -> Result<String, EngineError> {
        let program = self.invocation.program();
        let program_display = program.to_string_lossy().into_owned();

        tracing::debug!(
            "{}",
            ProcessSpawned {
                engine: self.engine.as_str(),
                program: &program_display,
            }
        );

        let mut command = Command::new(&program);
        command
            .args(&args)
            .stdin(if stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| EngineError::Spawn {
            program: program_display.clone(),
            source,
        })?;

        if let Some(content) = stdin_data {
            // Write the whole document and close stdin so the tool sees EOF.
            let mut stdin = child.stdin.take().ok_or_else(|| EngineError::Io {
                engine: self.engine,
                source: std::io::Error::other("child stdin unavailable"),
            })?;
            stdin
                .write_all(content.as_bytes())
                .await
                .map_err(|source| EngineError::Io {
                    engine: self.engine,
                    source,
                })?;
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| EngineError::Io {
                engine: self.engine,
                source,
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        tracing::debug!(
            "{}",
            ProcessExited {
                engine: self.engine.as_str(),
                program: &program_display,
                exit_code,
            }
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(self.classify_failure(exit_code, stderr));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| EngineError::InvalidOutput { engine: self.engine })
    }

    /// Maps a non-zero exit to an error, refining recognized `go tool`
    /// diagnostics into actionable messages. Same control path either way.
    fn classify_failure(&self, exit_code: i32, stderr: String) -> EngineError {
        if self.engine == Engine::GoTool {
            if stderr.contains("unknown tool") {
                return EngineError::GoToolNotRegistered {
                    module_path: GO_MODULE_PATH.to_string(),
                    stderr,
                };
            }
            if stderr.contains("requires go >=") || stderr.contains("unknown command") {
                return EngineError::GoToolchainOutdated { stderr };
            }
        }
        EngineError::Process {
            engine: self.engine,
            exit_code,
            stderr,
        }
    }

    async fn query_version(&self) -> Result<String, EngineError> {
        let mut args: Vec<OsString> = self
            .invocation
            .prefix_args()
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(VERSION_QUERY.into());
        let stdout = self.run(args, None).await?;
        Ok(stdout.trim().to_string())
    }
}

#[async_trait]
impl Formatter for CliFormatter {
    async fn initialize(&self) -> Result<(), FormatError> {
        let version = self.query_version().await?;
        tracing::debug!("[{}] resolved formatter version {}", self.engine, version);
        if let Ok(mut slot) = self.version.lock() {
            *slot = Some(version);
        }
        Ok(())
    }

    async fn format(&self, request: &FormatRequest) -> Result<String, FormatError> {
        let args = self.format_args(request);
        Ok(self.run(args, Some(&request.content)).await?)
    }

    async fn version(&self) -> Result<String, FormatError> {
        if let Ok(slot) = self.version.lock() {
            if let Some(version) = slot.as_ref() {
                return Ok(version.clone());
            }
        }
        Ok(self.query_version().await?)
    }

    fn engine(&self) -> Engine {
        self.engine
    }
}
