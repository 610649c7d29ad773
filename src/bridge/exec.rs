// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Reverse execution bridge.
//!
//! During a format call the WASM module may ask the host to run an external
//! command against a set of virtual files. The host services the request
//! synchronously: materialize a scratch directory, write the files, run the
//! command with stdin piped, capture stdout. The scratch directory is a
//! scoped resource and is removed on every exit path, success or failure.

use crate::bridge::error::ReverseExecError;
use std::collections::BTreeMap;
use std::io::Write;
use std::process::{Command, Stdio};

/// One module-initiated execution request. Ephemeral: created by the
/// module, consumed synchronously, gone when the call returns.
#[derive(Debug)]
pub struct ExecutionBridgeCall {
    pub command: String,
    pub stdin_data: String,
    pub virtual_files: BTreeMap<String, String>,
}

impl ExecutionBridgeCall {
    /// Builds a call from the module's wire representation. `virtual_files`
    /// arrives as a JSON object mapping file name to content.
    pub fn from_wire(
        command: String,
        stdin_data: String,
        virtual_files_json: &str,
    ) -> Result<ExecutionBridgeCall, ReverseExecError> {
        let virtual_files: BTreeMap<String, String> = if virtual_files_json.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(virtual_files_json)?
        };
        Ok(ExecutionBridgeCall {
            command,
            stdin_data,
            virtual_files,
        })
    }

    /// Runs the command and returns its stdout.
    pub fn execute(&self) -> Result<String, ReverseExecError> {
        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or(ReverseExecError::EmptyCommand)?
            .to_string();
        let args: Vec<&str> = parts.collect();

        // TempDir removal on drop covers every exit path below.
        let scratch = tempfile::Builder::new()
            .prefix("refmt-exec-")
            .tempdir()
            .map_err(ReverseExecError::TempDir)?;

        for (name, content) in &self.virtual_files {
            if name.is_empty()
                || name.contains('/')
                || name.contains('\\')
                || name == "."
                || name == ".."
            {
                return Err(ReverseExecError::InvalidFileName(name.clone()));
            }
            std::fs::write(scratch.path().join(name), content).map_err(|source| {
                ReverseExecError::WriteFile {
                    name: name.clone(),
                    source,
                }
            })?;
        }

        tracing::debug!("executing bridge command {:?}", self.command);

        let mut child = Command::new(&program)
            .args(&args)
            .current_dir(scratch.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ReverseExecError::Spawn {
                program: program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(self.stdin_data.as_bytes())
                .map_err(|source| ReverseExecError::Io {
                    program: program.clone(),
                    source,
                })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|source| ReverseExecError::Io {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ReverseExecError::CommandFailed {
                program,
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
