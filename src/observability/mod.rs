// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Message types follow a struct-based pattern with `Display`
//! implementations to keep diagnostic strings out of control-flow code and
//! consistent across the dispatcher. Messages are organized by subsystem:
//!
//! * `messages::bridge` - WASM engine lifecycle events
//! * `messages::dispatch` - per-request routing and fallback decisions
//! * `messages::process` - external process invocation events

pub mod messages;
