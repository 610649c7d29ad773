// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Host-side import surface of the WASM module.
//!
//! The module sees exactly five host functions, installed once at bridge
//! construction: a logging sink, the readiness signal, the reverse execution
//! handler, and the value retain/finalize pair. This is the module's entire
//! window into the host process; there is no ambient capability to reach
//! host I/O any other way.

use crate::bridge::exec::ExecutionBridgeCall;
use crate::bridge::shim::{FinalizerKind, HandleTable};
use anyhow::{anyhow, bail, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wasmtime::{Caller, Linker, Memory};

/// Import module name the shim manifests use.
pub const HOST_MODULE: &str = "host";

/// Per-store state shared with the host import closures.
pub struct BridgeStoreData {
    /// Process-wide readiness flag; the module sets it exactly once after
    /// its internal setup completes.
    pub(crate) ready: Arc<AtomicBool>,
    pub(crate) handles: HandleTable,
    pub(crate) finalizer: FinalizerKind,
}

impl BridgeStoreData {
    pub fn new(ready: Arc<AtomicBool>, finalizer: FinalizerKind) -> Self {
        BridgeStoreData {
            ready,
            handles: HandleTable::default(),
            finalizer,
        }
    }
}

fn memory_of(caller: &mut Caller<'_, BridgeStoreData>) -> Result<Memory> {
    caller
        .get_export("memory")
        .and_then(|export| export.into_memory())
        .ok_or_else(|| anyhow!("module must export 'memory'"))
}

fn read_guest_string(
    caller: &mut Caller<'_, BridgeStoreData>,
    memory: Memory,
    ptr: i32,
    len: i32,
) -> Result<String> {
    let start = usize::try_from(ptr).map_err(|_| anyhow!("negative guest pointer"))?;
    let length = usize::try_from(len).map_err(|_| anyhow!("negative guest length"))?;
    let data = memory.data(&caller);
    let bytes = data
        .get(start..start + length)
        .ok_or_else(|| anyhow!("guest read out of bounds"))?;
    Ok(std::str::from_utf8(bytes)
        .map_err(|e| anyhow!("invalid UTF-8 in guest memory: {}", e))?
        .to_string())
}

/// Copies `bytes` into fresh guest memory via the module's own allocator,
/// returning the guest pointer.
fn write_guest_bytes(caller: &mut Caller<'_, BridgeStoreData>, bytes: &[u8]) -> Result<i32> {
    let allocate = caller
        .get_export("allocate")
        .and_then(|export| export.into_func())
        .ok_or_else(|| anyhow!("module must export 'allocate'"))?
        .typed::<i32, i32>(&*caller)?;

    let len = i32::try_from(bytes.len()).map_err(|_| anyhow!("result too large for guest"))?;
    let ptr = allocate.call(&mut *caller, len)?;
    if ptr == 0 {
        bail!("guest allocator returned null");
    }

    let memory = memory_of(caller)?;
    memory
        .write(&mut *caller, ptr as usize, bytes)
        .map_err(|e| anyhow!("guest write out of bounds: {}", e))?;
    Ok(ptr)
}

/// Packs a guest (pointer, length) pair into the i64 wire form used by the
/// exec import's return value.
fn pack_ptr_len(ptr: i32, len: usize) -> i64 {
    (((ptr as u64) << 32) | (len as u64 & 0xffff_ffff)) as i64
}

/// Installs the host import surface on the linker.
pub fn install(linker: &mut Linker<BridgeStoreData>) -> Result<()> {
    linker.func_wrap(
        HOST_MODULE,
        "ready",
        |caller: Caller<'_, BridgeStoreData>| {
            caller.data().ready.store(true, Ordering::SeqCst);
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "log",
        |mut caller: Caller<'_, BridgeStoreData>, ptr: i32, len: i32| -> Result<()> {
            let memory = memory_of(&mut caller)?;
            let message = read_guest_string(&mut caller, memory, ptr, len)?;
            tracing::debug!(target: "refmt_host::module", "{}", message);
            Ok(())
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "retain_ref",
        |mut caller: Caller<'_, BridgeStoreData>, id: i32| {
            caller.data_mut().handles.retain(id as u32);
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "finalize_ref",
        |mut caller: Caller<'_, BridgeStoreData>, id: i32| -> Result<()> {
            let finalizer = caller.data().finalizer;
            match finalizer {
                FinalizerKind::Release => caller
                    .data_mut()
                    .handles
                    .release(id as u32)
                    .map_err(|message| anyhow!(message)),
                FinalizerKind::RefCounted => {
                    caller.data_mut().handles.finalize_ref_counted(id as u32);
                    Ok(())
                }
            }
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "exec",
        |mut caller: Caller<'_, BridgeStoreData>,
         command_ptr: i32,
         command_len: i32,
         stdin_ptr: i32,
         stdin_len: i32,
         files_ptr: i32,
         files_len: i32|
         -> Result<i64> {
            let memory = memory_of(&mut caller)?;
            let command = read_guest_string(&mut caller, memory, command_ptr, command_len)?;
            let stdin_data = read_guest_string(&mut caller, memory, stdin_ptr, stdin_len)?;
            let files_json = read_guest_string(&mut caller, memory, files_ptr, files_len)?;

            // A failure here unwinds the module's format call; the bridge
            // surfaces it as that call's formatting error.
            let call = ExecutionBridgeCall::from_wire(command, stdin_data, &files_json)?;
            let output = call.execute()?;

            let ptr = write_guest_bytes(&mut caller, output.as_bytes())?;
            Ok(pack_ptr_len(ptr, output.len()))
        },
    )?;

    Ok(())
}
