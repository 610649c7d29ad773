// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fallback controller: the top-level formatting entry point.
//!
//! One call per format request, typically one request per keystroke-triggered
//! format. Each request independently maps its format type, resolves its
//! engine from the current settings, and invokes the backend. A failed
//! primary engine is retried once against the in-process WASM engine unless
//! fallback is disabled. Failures degrade to "no edits" plus a diagnostic
//! log entry; they never surface to the editor collaborator as errors.


use crate::bridge::{BridgeConfig, WasmFormatter};
use crate::config::Settings;
use crate::engines::{
    resolve_engine, CliFormatter, Engine, FormatRequest, Formatter,
};
use crate::format_type::map_format_type;
use crate::observability::messages::dispatch::{
    FallbackDisabled, FallbackEngaged, FormatFailed,
};
use crate::probe::{ExecProbe, VersionProbe};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The editor collaborator's view of one document.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub file_path: PathBuf,
    pub language_id: String,
}

pub struct Dispatcher {
    bridge: Arc<WasmFormatter>,
    probe: Arc<dyn ExecProbe>,
    workspace_root: Option<PathBuf>,
    /// Engine used by the previous request, for lazy backend initialization
    /// on engine switches.
    last_engine: Mutex<Option<Engine>>,
}

impl Dispatcher {
    pub fn new(bridge_config: BridgeConfig) -> Self {
        Self::with_probe(bridge_config, Arc::new(VersionProbe))
    }

    pub fn with_probe(bridge_config: BridgeConfig, probe: Arc<dyn ExecProbe>) -> Self {
        Dispatcher {
            bridge: Arc::new(WasmFormatter::new(bridge_config)),
            probe,
            workspace_root: None,
            last_engine: Mutex::new(None),
        }
    }

    /// Sets the first workspace root used to resolve relative executable
    /// paths.
    pub fn with_workspace_root(mut self, root: PathBuf) -> Self {
        self.workspace_root = Some(root);
        self
    }

    pub fn bridge(&self) -> &Arc<WasmFormatter> {
        &self.bridge
    }

    /// Kicks off WASM engine initialization in the background. Called once
    /// at host startup, independent of the first format request.
    pub fn startup(&self) {
        let bridge = self.bridge.clone();
        tokio::spawn(async move {
            if let Err(e) = bridge.initialize_bridge().await {
                tracing::warn!("background WASM initialization failed: {}", e);
            }
        });
    }

    /// Formats one document, returning the full replacement text or `None`
    /// when formatting failed. Never errors.
    pub async fn handle(&self, document: &Document, settings: &Settings) -> Option<String> {
        let format = map_format_type(&document.language_id, settings.format_tf_as_hcl);
        tracing::debug!(
            "mapped language {} to format type {}",
            document.language_id,
            format
        );

        let request = FormatRequest {
            content: document.content.clone(),
            file_path: document.file_path.clone(),
            format,
        };

        let (engine, formatter) = match self.select_backend(settings).await {
            Some(selected) => selected,
            None => return None,
        };

        self.initialize_on_engine_switch(engine, formatter.as_ref())
            .await;

        let file_path = request.file_path.to_string_lossy().into_owned();
        match formatter.format(&request).await {
            Ok(text) => Some(text),
            Err(error) => {
                tracing::error!(
                    "{}",
                    FormatFailed {
                        engine: engine.as_str(),
                        file_path: &file_path,
                        error: &error,
                    }
                );

                if engine == Engine::Wasm {
                    return None;
                }
                if settings.disable_wasm_fallback {
                    tracing::info!("{}", FallbackDisabled);
                    return None;
                }

                tracing::info!("{}", FallbackEngaged { failed_engine: engine.as_str() });
                match self.bridge.format(&request).await {
                    Ok(text) => Some(text),
                    Err(fallback_error) => {
                        tracing::error!(
                            "{}",
                            FormatFailed {
                                engine: Engine::Wasm.as_str(),
                                file_path: &file_path,
                                error: &fallback_error,
                            }
                        );
                        None
                    }
                }
            }
        }
    }

    /// Resolves the engine for this request. The WASM preference goes
    /// straight to the bridge; everything else runs the probing selector
    /// off the event loop.
    async fn select_backend(
        &self,
        settings: &Settings,
    ) -> Option<(Engine, Arc<dyn Formatter>)> {
        if settings.engine == Engine::Wasm {
            let bridge: Arc<dyn Formatter> = self.bridge.clone();
            return Some((Engine::Wasm, bridge));
        }

        let probe = self.probe.clone();
        let settings = settings.clone();
        let workspace_root = self.workspace_root.clone();
        let resolved = tokio::task::spawn_blocking(move || {
            resolve_engine(&settings, workspace_root.as_deref(), &*probe)
        })
        .await;

        match resolved {
            Ok(resolved) => {
                tracing::debug!("resolved engine {}", resolved.engine);
                let formatter: Arc<dyn Formatter> =
                    Arc::new(CliFormatter::new(resolved.engine, resolved.invocation));
                Some((resolved.engine, formatter))
            }
            Err(e) => {
                tracing::error!("engine resolution task failed: {}", e);
                None
            }
        }
    }

    /// Initializes the backend when the engine changed since the previous
    /// request. Initialization failure is logged and not fatal: the format
    /// attempt itself decides whether the backend works.
    async fn initialize_on_engine_switch(&self, engine: Engine, formatter: &dyn Formatter) {
        let switched = {
            let mut last = self.last_engine.lock().await;
            if *last != Some(engine) {
                *last = Some(engine);
                true
            } else {
                false
            }
        };

        if switched {
            if let Err(e) = formatter.initialize().await {
                tracing::warn!("[{}] backend initialization failed: {}", engine, e);
            }
        }
    }
}
