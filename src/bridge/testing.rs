// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test fixtures for the WASM engine: small hand-assembled guest modules
//! implementing the format ABI, plus install-directory builders. Only
//! available in test builds.

use crate::bridge::loader::MODULE_FILE;
use crate::bridge::shim::{SHIM_FILE, SHIM_TINYGO_FILE};
use crate::bridge::BridgeConfig;
use std::time::Duration;
use tempfile::TempDir;

pub const STANDARD_SHIM: &str = r#"{
    "version": 1,
    "toolchain": "go",
    "imports": [
        {"module": "host", "name": "ready"},
        {"module": "host", "name": "log"},
        {"module": "host", "name": "exec"},
        {"module": "host", "name": "retain_ref"},
        {"module": "host", "name": "finalize_ref"}
    ]
}"#;

pub const TINYGO_SHIM: &str = r#"{
    "version": 1,
    "toolchain": "tinygo",
    "imports": [
        {"module": "host", "name": "ready"},
        {"module": "host", "name": "log"},
        {"module": "host", "name": "exec"},
        {"module": "host", "name": "retain_ref"},
        {"module": "host", "name": "finalize_ref"}
    ]
}"#;

/// Shared module scaffolding: linear memory, a bump allocator, and a no-op
/// deallocator, mirroring what the formatter toolchain emits.
const MODULE_PRELUDE: &str = r#"
  (memory (export "memory") 4)
  (global $next (mut i32) (i32.const 65536))
  (func (export "allocate") (param $size i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $next))
    (global.set $next
      (i32.add (global.get $next)
        (i32.and (i32.add (local.get $size) (i32.const 7)) (i32.const -8))))
    (local.get $ptr))
  (func (export "deallocate") (param $ptr i32) (param $size i32))
"#;

/// Signals readiness on start and answers every format call by echoing the
/// document content back unchanged.
pub fn echo_module() -> String {
    format!(
        r#"(module
  (import "host" "ready" (func $ready))
{MODULE_PRELUDE}
  (func (export "start") (call $ready))
  (func (export "fmt")
    (param $fmt_ptr i32) (param $fmt_len i32)
    (param $path_ptr i32) (param $path_len i32)
    (param $content_ptr i32) (param $content_len i32)
    (param $ec_ptr i32) (param $ec_len i32)
    (param $status_ptr i32) (param $out_len_ptr i32)
    (result i32)
    (i32.store (local.get $status_ptr) (i32.const 0))
    (i32.store (local.get $out_len_ptr) (local.get $content_len))
    (local.get $content_ptr)))"#
    )
}

/// Never signals readiness; used to drive the initialization timeout.
pub fn silent_module() -> String {
    format!(
        r#"(module
{MODULE_PRELUDE}
  (func (export "start"))
  (func (export "fmt")
    (param i32 i32 i32 i32 i32 i32 i32 i32 i32 i32)
    (result i32)
    (i32.const 0)))"#
    )
}

/// Reports a structured error for every format call.
pub fn error_module() -> String {
    format!(
        r#"(module
  (import "host" "ready" (func $ready))
{MODULE_PRELUDE}
  (data (i32.const 1024) "invalid syntax")
  (func (export "start") (call $ready))
  (func (export "fmt")
    (param $fmt_ptr i32) (param $fmt_len i32)
    (param $path_ptr i32) (param $path_len i32)
    (param $content_ptr i32) (param $content_len i32)
    (param $ec_ptr i32) (param $ec_len i32)
    (param $status_ptr i32) (param $out_len_ptr i32)
    (result i32)
    (i32.store (local.get $status_ptr) (i32.const 1))
    (i32.store (local.get $out_len_ptr) (i32.const 14))
    (i32.const 1024)))"#
    )
}

/// Routes every format call through the reverse execution bridge, running
/// `command` with the document content on stdin and returning its stdout.
pub fn exec_module(command: &str) -> String {
    let command_len = command.len();
    format!(
        r#"(module
  (import "host" "ready" (func $ready))
  (import "host" "exec" (func $exec (param i32 i32 i32 i32 i32 i32) (result i64)))
{MODULE_PRELUDE}
  (data (i32.const 1024) "{command}")
  (data (i32.const 1536) "{{}}")
  (func (export "start") (call $ready))
  (func (export "fmt")
    (param $fmt_ptr i32) (param $fmt_len i32)
    (param $path_ptr i32) (param $path_len i32)
    (param $content_ptr i32) (param $content_len i32)
    (param $ec_ptr i32) (param $ec_len i32)
    (param $status_ptr i32) (param $out_len_ptr i32)
    (result i32)
    (local $res i64)
    (local.set $res
      (call $exec
        (i32.const 1024) (i32.const {command_len})
        (local.get $content_ptr) (local.get $content_len)
        (i32.const 1536) (i32.const 2)))
    (i32.store (local.get $status_ptr) (i32.const 0))
    (i32.store (local.get $out_len_ptr) (i32.wrap_i64 (local.get $res)))
    (i32.wrap_i64 (i64.shr_u (local.get $res) (i64.const 32)))))"#
    )
}

/// Finalizes a value slot that was never retained, then echoes. Exercises
/// the difference between the release and ref-counted finalizer cleanups.
pub fn stray_finalizer_module() -> String {
    format!(
        r#"(module
  (import "host" "ready" (func $ready))
  (import "host" "finalize_ref" (func $finalize (param i32)))
{MODULE_PRELUDE}
  (func (export "start") (call $ready))
  (func (export "fmt")
    (param $fmt_ptr i32) (param $fmt_len i32)
    (param $path_ptr i32) (param $path_len i32)
    (param $content_ptr i32) (param $content_len i32)
    (param $ec_ptr i32) (param $ec_len i32)
    (param $status_ptr i32) (param $out_len_ptr i32)
    (result i32)
    (call $finalize (i32.const 42))
    (i32.store (local.get $status_ptr) (i32.const 0))
    (i32.store (local.get $out_len_ptr) (local.get $content_len))
    (local.get $content_ptr)))"#
    )
}

/// Writes a module and the standard shim manifest into a fresh install
/// directory.
pub fn install_fixture(wat_source: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let bytes = wat::parse_str(wat_source).unwrap();
    std::fs::write(dir.path().join(MODULE_FILE), bytes).unwrap();
    std::fs::write(dir.path().join(SHIM_FILE), STANDARD_SHIM).unwrap();
    dir
}

/// Same, but with the alternate-toolchain shim variant present.
pub fn install_fixture_with_tinygo_shim(wat_source: &str) -> TempDir {
    let dir = install_fixture(wat_source);
    std::fs::write(dir.path().join(SHIM_TINYGO_FILE), TINYGO_SHIM).unwrap();
    dir
}

/// Bridge config over the fixture with timeouts short enough for tests.
pub fn test_config(dir: &TempDir) -> BridgeConfig {
    BridgeConfig {
        install_dir: dir.path().to_path_buf(),
        init_timeout: Duration::from_millis(400),
        poll_interval: Duration::from_millis(25),
    }
}
