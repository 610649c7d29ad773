// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-process WASM formatting engine.
//!
//! The bridge loads the compiled formatter module into the host process once
//! and keeps it alive for the life of the process. Initialization is
//! idempotent and collapses concurrent callers onto a single attempt; a
//! failed initialization is terminal: later format calls fail fast rather
//! than retrying. Format calls run the module on a blocking task so the
//! host's event loop is never stalled by a long parse.

pub mod error;
pub mod exec;
pub mod host;
pub mod loader;
pub mod runtime;
pub mod shim;
pub mod state;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
pub mod testing;

pub use error::{BridgeError, ReverseExecError};
pub use exec::ExecutionBridgeCall;
pub use state::{BridgeCell, BridgeState};

use crate::engines::{Engine, FormatRequest, Formatter};
use crate::errors::FormatError;
use crate::observability::messages::bridge::{BridgeInitFailed, BridgeReady};
use crate::bridge::runtime::ModuleRuntime;
use crate::bridge::shim::ShimScript;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

/// Default readiness timeout.
pub const INIT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default readiness poll interval.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Where and how the bridge loads its artifacts.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Install-relative directory holding the module and shim manifest.
    pub install_dir: PathBuf,
    pub init_timeout: Duration,
    pub poll_interval: Duration,
}

impl BridgeConfig {
    pub fn new(install_dir: PathBuf) -> Self {
        BridgeConfig {
            install_dir,
            init_timeout: INIT_TIMEOUT,
            poll_interval: POLL_INTERVAL,
        }
    }
}

/// The in-process engine. One instance per host process; all format calls
/// share its lifecycle.
pub struct WasmFormatter {
    config: BridgeConfig,
    cell: BridgeCell,
    ready: Arc<AtomicBool>,
    start_error: Arc<Mutex<Option<String>>>,
    runtime: OnceLock<Arc<Mutex<ModuleRuntime>>>,
    format_calls: AtomicU32,
}

impl WasmFormatter {
    pub fn new(config: BridgeConfig) -> Self {
        WasmFormatter {
            config,
            cell: BridgeCell::new(),
            ready: Arc::new(AtomicBool::new(false)),
            start_error: Arc::new(Mutex::new(None)),
            runtime: OnceLock::new(),
            format_calls: AtomicU32::new(0),
        }
    }

    pub fn state(&self) -> BridgeState {
        self.cell.state()
    }

    /// Idempotent initialization. The first caller runs the real work;
    /// concurrent callers await the same attempt; later callers observe the
    /// settled outcome immediately.
    pub async fn initialize_bridge(&self) -> Result<(), BridgeError> {
        if !self.cell.try_begin() {
            return match self.cell.settled().await {
                BridgeState::Ready => Ok(()),
                BridgeState::Failed(message) => Err(BridgeError::InitFailure(message)),
                BridgeState::Uninitialized | BridgeState::Loading => Err(BridgeError::NotReady),
            };
        }

        let outcome = self.run_initialization().await;
        match &outcome {
            Ok(()) => self.cell.complete(Ok(())),
            Err(e) => {
                tracing::error!("{}", BridgeInitFailed { error: e });
                self.cell.complete(Err(e.to_string()));
            }
        }
        outcome
    }

    async fn run_initialization(&self) -> Result<(), BridgeError> {
        let started = Instant::now();

        let shim = ShimScript::load(&self.config.install_dir)?;
        tracing::debug!(
            "using {} bootstrap shim from {}",
            shim.toolchain(),
            shim.source_path().display()
        );

        let module_bytes = loader::load_module_bytes(&self.config.install_dir)?;

        let ready = self.ready.clone();
        let start_error = self.start_error.clone();
        let (runtime_tx, runtime_rx) = oneshot::channel();

        // The module runs on the blocking pool: instantiation is CPU-bound
        // and the start export may run for as long as the module's setup
        // takes. Readiness is observed through the shared flag, not through
        // task completion, so a wedged module cannot stall this function
        // past the timeout.
        tokio::task::spawn_blocking(move || {
            let runtime = match ModuleRuntime::instantiate(&shim, &module_bytes, ready) {
                Ok(runtime) => Arc::new(Mutex::new(runtime)),
                Err(e) => {
                    let _ = runtime_tx.send(Err(e));
                    return;
                }
            };
            if runtime_tx.send(Ok(runtime.clone())).is_err() {
                return;
            }
            match runtime.lock() {
                Ok(mut guard) => {
                    if let Err(e) = guard.run_start() {
                        if let Ok(mut slot) = start_error.lock() {
                            *slot = Some(e.to_string());
                        }
                    }
                }
                Err(_) => {
                    if let Ok(mut slot) = start_error.lock() {
                        *slot = Some("module runtime lock poisoned during start".to_string());
                    }
                }
            };
        });

        let runtime = runtime_rx.await.map_err(|_| {
            BridgeError::InitFailure("module task ended before instantiation completed".to_string())
        })??;
        let _ = self.runtime.set(runtime);

        loop {
            if let Some(message) = self
                .start_error
                .lock()
                .ok()
                .and_then(|slot| slot.clone())
            {
                return Err(BridgeError::InitFailure(message));
            }
            if self.ready.load(Ordering::SeqCst) {
                break;
            }
            if started.elapsed() >= self.config.init_timeout {
                return Err(BridgeError::InitTimeout(self.config.init_timeout));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }

        tracing::info!(
            "{}",
            BridgeReady {
                elapsed_ms: started.elapsed().as_millis() as u64,
            }
        );
        Ok(())
    }

    /// One format call with explicit editor-config content.
    pub async fn format_with_editor_config(
        &self,
        request: &FormatRequest,
        editor_config: Option<String>,
    ) -> Result<String, BridgeError> {
        match self.cell.state() {
            BridgeState::Ready => {}
            BridgeState::Failed(message) => return Err(BridgeError::InitFailure(message)),
            BridgeState::Uninitialized | BridgeState::Loading => {
                return Err(BridgeError::NotReady)
            }
        }

        self.format_calls.fetch_add(1, Ordering::SeqCst);

        let runtime = self
            .runtime
            .get()
            .cloned()
            .ok_or(BridgeError::NotReady)?;
        let request = request.clone();
        let editor_config = editor_config.unwrap_or_default();

        tokio::task::spawn_blocking(move || {
            let mut guard = runtime.lock().map_err(|_| {
                BridgeError::Unavailable("module runtime lock poisoned".to_string())
            })?;
            guard.fmt_call(&request, &editor_config)
        })
        .await
        .map_err(|e| BridgeError::Unavailable(format!("module call task failed: {}", e)))?
    }

    /// Number of format calls issued against the module. Used by dispatcher
    /// tests to assert fallback behavior.
    pub(crate) fn format_call_count(&self) -> u32 {
        self.format_calls.load(Ordering::SeqCst)
    }

    /// Number of initialization attempts that actually began.
    pub(crate) fn init_attempts(&self) -> u32 {
        self.cell.attempts()
    }
}

#[async_trait]
impl Formatter for WasmFormatter {
    async fn initialize(&self) -> Result<(), FormatError> {
        Ok(self.initialize_bridge().await?)
    }

    async fn format(&self, request: &FormatRequest) -> Result<String, FormatError> {
        // Style configuration is handed to the module as raw text; the
        // nearest file is rediscovered on every request.
        let editor_config = crate::editorconfig::discover(&request.file_path);
        Ok(self
            .format_with_editor_config(request, editor_config)
            .await?)
    }

    async fn version(&self) -> Result<String, FormatError> {
        // The module artifact ships with the host, so its version is the
        // host crate version.
        Ok(env!("CARGO_PKG_VERSION").to_string())
    }

    fn engine(&self) -> Engine {
        Engine::Wasm
    }
}
