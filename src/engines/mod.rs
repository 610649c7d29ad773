// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Formatting engine abstractions.
//!
//! Every backend (the in-process WASM engine and the four process-backed
//! invocation strategies) implements the [`Formatter`] trait and is selected
//! by a single [`Engine`] tag. Engine selection happens fresh on every format
//! request; see [`selector`].

pub mod cli;
pub mod selector;

pub use cli::{CliFormatter, Invocation};
pub use selector::{resolve_engine, ResolvedEngine};

use crate::errors::FormatError;
use crate::format_type::FormatType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter as FmtFormatter};
use std::path::PathBuf;

/// Default bare executable name looked up on the process search path.
pub const DEFAULT_EXECUTABLE: &str = "refmt";

/// Go module path of the formatter CLI, used by the toolchain-backed
/// invocation strategies.
pub const GO_MODULE_PATH: &str = "github.com/refmt/refmt/v2/cmd/refmt";

/// The interchangeable formatting backends.
///
/// A variant is chosen per request from current configuration and never
/// changes for the lifetime of that request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Engine {
    /// In-process WASM engine; the default and the fallback tier.
    #[default]
    Wasm,
    /// `go tool <module>`, the toolchain's installed-tool mechanism.
    GoTool,
    /// `go run <module>@<version>`, fetch-and-run at a pinned version.
    GoRun,
    /// Bare executable name resolved through the process search path.
    Path,
    /// Explicit, possibly workspace-relative, executable path.
    Local,
}

impl Engine {
    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Wasm => "wasm",
            Engine::GoTool => "go-tool",
            Engine::GoRun => "go-run",
            Engine::Path => "path",
            Engine::Local => "local",
        }
    }
}

impl Display for Engine {
    fn fmt(&self, f: &mut FmtFormatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One formatting request, constructed per call and never mutated.
#[derive(Debug, Clone)]
pub struct FormatRequest {
    pub content: String,
    pub file_path: PathBuf,
    pub format: FormatType,
}

/// Common surface of all formatting backends.
#[async_trait]
pub trait Formatter: Send + Sync {
    /// Prepares the backend for use. Idempotent where the backend has
    /// one-time setup; a cheap no-op otherwise.
    async fn initialize(&self) -> Result<(), FormatError>;

    /// Formats one request, returning the full replacement text.
    async fn format(&self, request: &FormatRequest) -> Result<String, FormatError>;

    /// Reports the backend's formatter version.
    async fn version(&self) -> Result<String, FormatError>;

    /// The engine tag this backend was selected as.
    fn engine(&self) -> Engine;
}
