// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Dispatcher settings.
//!
//! Settings are owned and persisted by the editor collaborator; the
//! dispatcher receives a snapshot per request and never caches it, so a
//! configuration change takes effect on the very next keystroke.

use crate::engines::Engine;
use serde::Deserialize;

/// Per-request configuration snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Preferred formatting engine. Defaults to the in-process WASM engine.
    pub engine: Engine,

    /// Explicit executable path. Unset means the bare default name on the
    /// process search path.
    pub executable: Option<String>,

    /// Force the toolchain-managed engine regardless of other settings.
    pub run_as_go_tool: bool,

    /// Suppress the retry against the WASM engine when the primary fails.
    pub disable_wasm_fallback: bool,

    /// Treat the Terraform dialect as its structural HCL superset.
    pub format_tf_as_hcl: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.engine, Engine::Wasm);
        assert_eq!(settings.executable, None);
        assert!(!settings.run_as_go_tool);
        assert!(!settings.disable_wasm_fallback);
        assert!(!settings.format_tf_as_hcl);
    }

    #[test]
    fn test_deserializes_from_collaborator_json() {
        let settings: Settings = serde_json::from_str(
            r#"{
                "engine": "go-tool",
                "executable": "bin/refmt",
                "disable_wasm_fallback": true
            }"#,
        )
        .unwrap();
        assert_eq!(settings.engine, Engine::GoTool);
        assert_eq!(settings.executable.as_deref(), Some("bin/refmt"));
        assert!(settings.disable_wasm_fallback);
        assert!(!settings.format_tf_as_hcl);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        // The collaborator owns the full configuration namespace; the
        // dispatcher only reads its own keys.
        let settings: Settings =
            serde_json::from_str(r#"{"engine": "path", "telemetry": false}"#).unwrap();
        assert_eq!(settings.engine, Engine::Path);
    }
}
