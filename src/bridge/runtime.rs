// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Instantiated module runtime and the format call ABI.
//!
//! The formatter artifact is a classic core module with C-style exports:
//! `memory`, `allocate`, `deallocate`, `start`, and `fmt`. Strings cross the
//! boundary as (pointer, length) pairs in guest memory allocated through the
//! module's own allocator. The format entry point answers with a
//! result/error pair: a status cell plus one output buffer that holds either
//! the formatted text or the error message. The output buffer is owned and
//! reclaimed by the module's own memory management; the host deallocates
//! only what it allocated.

use crate::bridge::error::BridgeError;
use crate::bridge::host::{self, BridgeStoreData};
use crate::bridge::loader::{create_engine, ensure_core_module, validate_imports};
use crate::bridge::shim::ShimScript;
use crate::engines::FormatRequest;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use wasmtime::{Instance, Linker, Memory, Module, Store, TypedFunc};

/// Fuel budget per call into the module (1G instructions). Formatting a
/// single editor document never comes near this; a runaway module does.
const FUEL_LEVEL: u64 = 1_000_000_000;

/// `fmt(format_ptr, format_len, path_ptr, path_len, content_ptr,
/// content_len, editorconfig_ptr, editorconfig_len, status_ptr,
/// out_len_ptr) -> out_ptr`
type FmtParams = (i32, i32, i32, i32, i32, i32, i32, i32, i32, i32);

pub struct ModuleRuntime {
    store: Store<BridgeStoreData>,
    memory: Memory,
    allocate: TypedFunc<i32, i32>,
    deallocate: TypedFunc<(i32, i32), ()>,
    start: TypedFunc<(), ()>,
    fmt: TypedFunc<FmtParams, i32>,
}

impl ModuleRuntime {
    /// Compiles and instantiates the module against the shim's import
    /// surface. Does not run the module yet.
    pub fn instantiate(
        shim: &ShimScript,
        module_bytes: &[u8],
        ready: Arc<AtomicBool>,
    ) -> Result<ModuleRuntime, BridgeError> {
        ensure_core_module(module_bytes)?;

        let engine = create_engine()?;
        let module = Module::new(&engine, module_bytes)
            .map_err(|e| BridgeError::InvalidBinary(e.to_string()))?;
        validate_imports(&module, shim)?;

        let mut linker: Linker<BridgeStoreData> = Linker::new(&engine);
        host::install(&mut linker).map_err(|e| BridgeError::InitFailure(e.to_string()))?;

        let mut store = Store::new(&engine, BridgeStoreData::new(ready, shim.finalizer()));
        store
            .set_fuel(FUEL_LEVEL)
            .map_err(|e| BridgeError::InitFailure(e.to_string()))?;

        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| BridgeError::InitFailure(e.to_string()))?;

        Self::bind(store, instance)
    }

    fn bind(
        mut store: Store<BridgeStoreData>,
        instance: Instance,
    ) -> Result<ModuleRuntime, BridgeError> {
        let memory = instance
            .get_memory(&mut store, "memory")
            .ok_or_else(|| BridgeError::InitFailure("module must export 'memory'".to_string()))?;

        let allocate = instance
            .get_typed_func::<i32, i32>(&mut store, "allocate")
            .map_err(|e| BridgeError::InitFailure(format!("missing 'allocate' export: {}", e)))?;
        let deallocate = instance
            .get_typed_func::<(i32, i32), ()>(&mut store, "deallocate")
            .map_err(|e| BridgeError::InitFailure(format!("missing 'deallocate' export: {}", e)))?;
        let start = instance
            .get_typed_func::<(), ()>(&mut store, "start")
            .map_err(|e| BridgeError::InitFailure(format!("missing 'start' export: {}", e)))?;
        let fmt = instance
            .get_typed_func::<FmtParams, i32>(&mut store, "fmt")
            .map_err(|e| BridgeError::InitFailure(format!("missing 'fmt' export: {}", e)))?;

        Ok(ModuleRuntime {
            store,
            memory,
            allocate,
            deallocate,
            start,
            fmt,
        })
    }

    /// Runs the module's start export. The module performs its internal
    /// setup and signals the readiness flag through the host import.
    pub fn run_start(&mut self) -> Result<(), BridgeError> {
        self.store
            .set_fuel(FUEL_LEVEL)
            .map_err(|e| BridgeError::InitFailure(e.to_string()))?;
        self.start
            .call(&mut self.store, ())
            .map_err(|e| BridgeError::InitFailure(format!("module start trapped: {}", e)))
    }

    /// One synchronous format call into the module.
    pub fn fmt_call(
        &mut self,
        request: &FormatRequest,
        editor_config: &str,
    ) -> Result<String, BridgeError> {
        self.store
            .set_fuel(FUEL_LEVEL)
            .map_err(|e| BridgeError::Unavailable(e.to_string()))?;

        let format = self.write_string(request.format.as_str())?;
        let path = self.write_string(&request.file_path.to_string_lossy())?;
        let content = self.write_string(&request.content)?;
        let editor_config = self.write_string(editor_config)?;
        let status_ptr = self.alloc_cell()?;
        let out_len_ptr = self.alloc_cell()?;

        let call_result = self.fmt.call(
            &mut self.store,
            (
                format.0,
                format.1,
                path.0,
                path.1,
                content.0,
                content.1,
                editor_config.0,
                editor_config.1,
                status_ptr,
                out_len_ptr,
            ),
        );

        // The module read everything it needed; reclaim host-allocated
        // buffers before inspecting the outcome.
        let out_ptr = match call_result {
            Ok(ptr) => ptr,
            Err(trap) => {
                self.release_call_buffers(&[format, path, content, editor_config])?;
                self.release_cells(&[status_ptr, out_len_ptr])?;
                return Err(BridgeError::ModuleFormat(trap.to_string()));
            }
        };

        let status = self.read_i32(status_ptr)?;
        let out_len = self.read_i32(out_len_ptr)?;
        let output = self.read_string(out_ptr, out_len)?;

        self.release_call_buffers(&[format, path, content, editor_config])?;
        self.release_cells(&[status_ptr, out_len_ptr])?;

        if status != 0 {
            return Err(BridgeError::ModuleFormat(output));
        }
        Ok(output)
    }

    fn write_string(&mut self, value: &str) -> Result<(i32, i32), BridgeError> {
        let bytes = value.as_bytes();
        let len = i32::try_from(bytes.len())
            .map_err(|_| BridgeError::Unavailable("input too large for guest memory".to_string()))?;

        let ptr = self
            .allocate
            .call(&mut self.store, len)
            .map_err(|e| BridgeError::ModuleFormat(format!("guest allocation trapped: {}", e)))?;
        if ptr == 0 {
            return Err(BridgeError::Unavailable(
                "guest allocator returned null".to_string(),
            ));
        }

        self.memory
            .write(&mut self.store, ptr as usize, bytes)
            .map_err(|e| BridgeError::Unavailable(format!("guest write failed: {}", e)))?;
        Ok((ptr, len))
    }

    /// Allocates one zeroed i32 out-cell in guest memory.
    fn alloc_cell(&mut self) -> Result<i32, BridgeError> {
        let ptr = self
            .allocate
            .call(&mut self.store, 4)
            .map_err(|e| BridgeError::ModuleFormat(format!("guest allocation trapped: {}", e)))?;
        if ptr == 0 {
            return Err(BridgeError::Unavailable(
                "guest allocator returned null".to_string(),
            ));
        }
        self.memory
            .write(&mut self.store, ptr as usize, &[0u8; 4])
            .map_err(|e| BridgeError::Unavailable(format!("guest write failed: {}", e)))?;
        Ok(ptr)
    }

    fn release_call_buffers(&mut self, buffers: &[(i32, i32)]) -> Result<(), BridgeError> {
        for &(ptr, len) in buffers {
            self.deallocate
                .call(&mut self.store, (ptr, len))
                .map_err(|e| BridgeError::Unavailable(format!("guest deallocation trapped: {}", e)))?;
        }
        Ok(())
    }

    fn release_cells(&mut self, cells: &[i32]) -> Result<(), BridgeError> {
        for &ptr in cells {
            self.deallocate
                .call(&mut self.store, (ptr, 4))
                .map_err(|e| BridgeError::Unavailable(format!("guest deallocation trapped: {}", e)))?;
        }
        Ok(())
    }

    fn read_i32(&mut self, ptr: i32) -> Result<i32, BridgeError> {
        let mut bytes = [0u8; 4];
        self.memory
            .read(&self.store, ptr as usize, &mut bytes)
            .map_err(|e| BridgeError::Unavailable(format!("guest read failed: {}", e)))?;
        Ok(i32::from_le_bytes(bytes))
    }

    fn read_string(&mut self, ptr: i32, len: i32) -> Result<String, BridgeError> {
        if ptr == 0 || len <= 0 {
            return Ok(String::new());
        }
        let mut bytes = vec![0u8; len as usize];
        self.memory
            .read(&self.store, ptr as usize, &mut bytes)
            .map_err(|e| BridgeError::Unavailable(format!("guest read failed: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|_| BridgeError::ModuleFormat("module produced non-UTF-8 output".to_string()))
    }
}
