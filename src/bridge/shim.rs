// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bootstrap shim manifest.
//!
//! The WASM artifact ships with a shim manifest produced by the formatter's
//! own toolchain. The manifest names every host import the module may use;
//! anything outside that table is rejected before instantiation. Two shim
//! variants exist: the standard one, and an alternate one emitted by the
//! TinyGo toolchain. The alternate variant's value finalizer is known to
//! trap when a slot is finalized more than once, so a versioned
//! compatibility patch swaps it for a reference-counted cleanup. The patch
//! prevents the trap but not a slow growth of the handle table in very long
//! sessions, a known and accepted limitation.

use crate::bridge::error::BridgeError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Shim manifest file names inside the install directory.
pub const SHIM_FILE: &str = "runtime_shim.json";
pub const SHIM_TINYGO_FILE: &str = "runtime_shim.tinygo.json";

/// The one manifest schema version this host understands.
pub const SUPPORTED_SHIM_VERSION: u32 = 1;

/// Cleanup semantics of the module's `finalize_ref` import.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FinalizerKind {
    /// Release the slot immediately; finalizing an unknown slot traps.
    #[default]
    Release,
    /// Decrement a liveness count and release only at zero; unknown slots
    /// are tolerated.
    RefCounted,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Hash)]
pub struct ShimImport {
    pub module: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ShimManifest {
    version: u32,
    toolchain: String,
    #[serde(default)]
    finalizer: FinalizerKind,
    imports: Vec<ShimImport>,
}

/// Parsed and post-processed bootstrap shim.
#[derive(Debug, Clone)]
pub struct ShimScript {
    manifest: ShimManifest,
    source_path: PathBuf,
}

impl ShimScript {
    /// Loads the shim manifest from the install directory, preferring the
    /// alternate-toolchain variant when that file is present.
    pub fn load(install_dir: &Path) -> Result<ShimScript, BridgeError> {
        let alternate = install_dir.join(SHIM_TINYGO_FILE);
        let (source_path, is_alternate) = if alternate.is_file() {
            (alternate, true)
        } else {
            (install_dir.join(SHIM_FILE), false)
        };

        let text = std::fs::read_to_string(&source_path).map_err(|e| {
            BridgeError::Shim(format!(
                "failed to read shim manifest {}: {}",
                source_path.display(),
                e
            ))
        })?;
        Self::parse(&text, source_path, is_alternate)
    }

    fn parse(
        text: &str,
        source_path: PathBuf,
        is_alternate: bool,
    ) -> Result<ShimScript, BridgeError> {
        let mut manifest: ShimManifest = serde_json::from_str(text)
            .map_err(|e| BridgeError::Shim(format!("malformed shim manifest: {}", e)))?;

        if manifest.version != SUPPORTED_SHIM_VERSION {
            return Err(BridgeError::Shim(format!(
                "unsupported shim manifest version {} (expected {})",
                manifest.version, SUPPORTED_SHIM_VERSION
            )));
        }

        if is_alternate {
            apply_alternate_finalizer_patch(&mut manifest);
        }

        Ok(ShimScript {
            manifest,
            source_path,
        })
    }

    pub fn toolchain(&self) -> &str {
        &self.manifest.toolchain
    }

    pub fn finalizer(&self) -> FinalizerKind {
        self.manifest.finalizer
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// True when the manifest's import table covers `(module, name)`.
    pub fn allows_import(&self, module: &str, name: &str) -> bool {
        self.manifest
            .imports
            .iter()
            .any(|import| import.module == module && import.name == name)
    }
}

/// The versioned compatibility patch for the alternate-toolchain shim:
/// replaces the release-on-finalize cleanup with the reference-counted one.
/// Scoped strictly to that variant; the standard shim runs unmodified.
fn apply_alternate_finalizer_patch(manifest: &mut ShimManifest) {
    if manifest.finalizer == FinalizerKind::Release {
        tracing::debug!(
            "patching {} shim finalizer to ref-counted cleanup",
            manifest.toolchain
        );
        manifest.finalizer = FinalizerKind::RefCounted;
    }
}

/// Liveness tracking for host-value slots held by the module.
///
/// The module announces a live slot with `retain_ref` and releases it with
/// `finalize_ref`; which cleanup runs depends on the shim's
/// [`FinalizerKind`].
#[derive(Debug, Default)]
pub struct HandleTable {
    counts: HashMap<u32, u32>,
}

impl HandleTable {
    pub fn retain(&mut self, id: u32) {
        *self.counts.entry(id).or_insert(0) += 1;
    }

    /// Release-on-finalize cleanup. Errors on a slot that is not live,
    /// which is the defect the alternate shim variant is known to trip.
    pub fn release(&mut self, id: u32) -> Result<(), String> {
        match self.counts.remove(&id) {
            Some(_) => Ok(()),
            None => Err(format!("finalized unknown value slot {}", id)),
        }
    }

    /// Reference-counted cleanup: decrement, release the slot at zero,
    /// tolerate unknown ids.
    pub fn finalize_ref_counted(&mut self, id: u32) {
        if let Some(count) = self.counts.get_mut(&id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(&id);
            }
        }
    }

    pub fn live(&self) -> usize {
        self.counts.len()
    }
}
