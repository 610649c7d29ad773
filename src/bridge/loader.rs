// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM artifact loading and validation.
//!
//! Reads the compiled module from the install directory and validates it
//! before compilation: size bounds, a spec-compliant core-module check via
//! wasmparser, and an import check against the bootstrap shim's table. The
//! formatter artifact is a classic core module; Component Model binaries are
//! rejected up front with a clear message instead of failing deep inside
//! instantiation.

use crate::bridge::error::BridgeError;
use crate::bridge::shim::ShimScript;
use std::path::Path;
use wasmparser::{Encoding, Parser, Payload};
use wasmtime::{Config, Engine, Module};

/// File name of the compiled formatter module inside the install directory.
pub const MODULE_FILE: &str = "refmt.wasm";

/// Maximum allowed size for the module binary (32 MB). The shipped artifact
/// is a whole formatter toolchain, so the bound is generous.
const MAX_MODULE_SIZE: usize = 32 * 1024 * 1024;

/// Reads the module bytes from the install directory and checks the size
/// bound.
pub fn load_module_bytes(install_dir: &Path) -> Result<Vec<u8>, BridgeError> {
    let path = install_dir.join(MODULE_FILE);
    let bytes = std::fs::read(&path).map_err(|e| {
        BridgeError::InitFailure(format!("failed to read {}: {}", path.display(), e))
    })?;

    if bytes.len() > MAX_MODULE_SIZE {
        return Err(BridgeError::InvalidBinary(format!(
            "module too large: {} bytes (max: {} bytes)",
            bytes.len(),
            MAX_MODULE_SIZE
        )));
    }

    tracing::debug!("loaded WASM module {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Verifies the binary is a classic core module.
pub fn ensure_core_module(bytes: &[u8]) -> Result<(), BridgeError> {
    let parser = Parser::new(0);
    let mut encoding = None;

    for payload in parser.parse_all(bytes) {
        let payload = payload.map_err(|e| BridgeError::InvalidBinary(e.to_string()))?;
        if let Payload::Version { encoding: enc, .. } = payload {
            encoding = Some(enc);
            // The version header is all we need; no point parsing the rest.
            break;
        }
    }

    match encoding {
        Some(Encoding::Module) => Ok(()),
        Some(Encoding::Component) => Err(BridgeError::InvalidBinary(
            "Component Model binaries are not supported; the formatter artifact must be a core WASM module"
                .to_string(),
        )),
        None => Err(BridgeError::InvalidBinary(
            "missing WASM version header".to_string(),
        )),
    }
}

/// Creates the wasmtime engine the bridge runs on.
///
/// Fuel metering bounds a runaway module; everything the formatter artifact
/// does not need is switched off.
pub fn create_engine() -> Result<Engine, BridgeError> {
    let mut config = Config::new();
    config.wasm_threads(false);
    config.wasm_simd(false);
    config.wasm_relaxed_simd(false);
    config.wasm_multi_memory(false);
    config.wasm_memory64(false);
    config.wasm_component_model(false);
    config.consume_fuel(true);
    config.epoch_interruption(false);

    Engine::new(&config).map_err(|e| BridgeError::InitFailure(e.to_string()))
}

/// Checks every module import against the shim manifest's table. The shim
/// is the module's complete window into the host; an import outside it
/// means artifact and shim are out of step.
pub fn validate_imports(module: &Module, shim: &ShimScript) -> Result<(), BridgeError> {
    for import in module.imports() {
        if !shim.allows_import(import.module(), import.name()) {
            return Err(BridgeError::Shim(format!(
                "module import {}::{} is not covered by the shim manifest {}",
                import.module(),
                import.name(),
                shim.source_path().display()
            )));
        }
    }
    Ok(())
}
