// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod bridge;        // in-process WASM engine
pub mod config;        // per-request settings
pub mod dispatcher;    // fallback controller
pub mod editorconfig;  // nearest style-config discovery
pub mod engines;       // engine tags, trait, process adapters
pub mod errors;        // error handling
pub mod format_type;   // language id -> format type
pub mod observability;
pub mod probe;         // executable probing

pub use bridge::{BridgeConfig, BridgeState, WasmFormatter};
pub use config::Settings;
pub use dispatcher::{Dispatcher, Document};
pub use engines::{Engine, FormatRequest, Formatter};
pub use format_type::{map_format_type, FormatType, SUPPORTED_LANGUAGES};
