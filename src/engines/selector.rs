// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-request engine resolution.
//!
//! Resolution is deliberately stateless: configuration can change between
//! keystrokes, so the selector re-derives its answer on every call and caches
//! nothing. Probe outcomes are the only environment input, which keeps the
//! resolution deterministic and testable.

use crate::config::Settings;
use crate::engines::{Engine, Invocation, DEFAULT_EXECUTABLE};
use crate::probe::ExecProbe;
use std::path::{Path, PathBuf};

/// Outcome of engine resolution: the tag plus the concrete invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEngine {
    pub engine: Engine,
    pub invocation: Invocation,
}

impl ResolvedEngine {
    fn go_tool() -> Self {
        ResolvedEngine {
            engine: Engine::GoTool,
            invocation: Invocation::go_tool(),
        }
    }

    fn go_run() -> Self {
        ResolvedEngine {
            engine: Engine::GoRun,
            invocation: Invocation::go_run_at_host_version(),
        }
    }

    fn direct(engine: Engine, program: PathBuf) -> Self {
        ResolvedEngine {
            engine,
            invocation: Invocation::Direct { program },
        }
    }
}

/// Resolves a concrete engine and invocation from the current settings.
///
/// The rules, in order:
/// 1. `run_as_go_tool` forces the toolchain-managed engine without probing;
///    `go tool` reports its own failures at invocation time.
/// 2. No configured executable (or the bare default name): probe the bare
///    name on the search path, falling back to fetch-and-run.
/// 3. An absolute configured path is probed directly.
/// 4. A relative configured path is resolved against the first workspace
///    root, or the current working directory when no workspace is open.
pub fn resolve_engine(
    settings: &Settings,
    workspace_root: Option<&Path>,
    probe: &dyn ExecProbe,
) -> ResolvedEngine {
    if settings.run_as_go_tool {
        return ResolvedEngine::go_tool();
    }

    let configured = settings.executable.as_deref().unwrap_or("");
    if configured.is_empty() || configured == DEFAULT_EXECUTABLE {
        let bare = PathBuf::from(DEFAULT_EXECUTABLE);
        if probe.probe(&bare) {
            return ResolvedEngine::direct(Engine::Path, bare);
        }
        return ResolvedEngine::go_run();
    }

    let configured_path = PathBuf::from(configured);
    let resolved = if configured_path.is_absolute() {
        configured_path
    } else {
        match workspace_root {
            Some(root) => root.join(&configured_path),
            None => configured_path,
        }
    };

    if probe.probe(&resolved) {
        return ResolvedEngine::direct(Engine::Local, resolved);
    }
    ResolvedEngine::go_run()
}
