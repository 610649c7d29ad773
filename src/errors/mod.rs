// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod engine;

pub use engine::EngineError;

use crate::bridge::BridgeError;
use thiserror::Error;

/// Top-level failure of one format attempt against one engine.
///
/// The fallback controller is the only consumer: it logs these with the
/// originating engine tag and decides whether to retry against the WASM
/// engine. They never escape to the editor collaborator.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}
