// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end tests of the WASM engine lifecycle against hand-assembled
//! guest modules.

use crate::bridge::testing::{
    echo_module, error_module, exec_module, install_fixture,
    install_fixture_with_tinygo_shim, silent_module, stray_finalizer_module, test_config,
};
use crate::bridge::{BridgeError, BridgeState, WasmFormatter};
use crate::engines::FormatRequest;
use crate::format_type::FormatType;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

fn request(content: &str) -> FormatRequest {
    FormatRequest {
        content: content.to_string(),
        file_path: PathBuf::from("/work/main.hcl"),
        format: FormatType::Hcl,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_initialize_then_format_round_trip() {
    let fixture = install_fixture(&echo_module());
    let bridge = WasmFormatter::new(test_config(&fixture));

    bridge.initialize_bridge().await.unwrap();
    assert_eq!(bridge.state(), BridgeState::Ready);

    let result = bridge
        .format_with_editor_config(&request("a  =  1\n"), None)
        .await
        .unwrap();
    assert_eq!(result, "a  =  1\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_initialize_is_a_noop() {
    let fixture = install_fixture(&echo_module());
    let bridge = WasmFormatter::new(test_config(&fixture));

    bridge.initialize_bridge().await.unwrap();
    bridge.initialize_bridge().await.unwrap();
    assert_eq!(bridge.init_attempts(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_initialize_collapses_to_one_attempt() {
    let fixture = install_fixture(&echo_module());
    let bridge = Arc::new(WasmFormatter::new(test_config(&fixture)));

    let first = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.initialize_bridge().await })
    };
    let second = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.initialize_bridge().await })
    };

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert_eq!(bridge.init_attempts(), 1);
    assert_eq!(bridge.state(), BridgeState::Ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_format_before_initialize_fails_fast() {
    let fixture = install_fixture(&echo_module());
    let bridge = WasmFormatter::new(test_config(&fixture));

    let err = bridge
        .format_with_editor_config(&request("x"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::NotReady));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_module_that_never_signals_ready_times_out() {
    let fixture = install_fixture(&silent_module());
    let bridge = WasmFormatter::new(test_config(&fixture));

    let err = bridge.initialize_bridge().await.unwrap_err();
    assert!(matches!(err, BridgeError::InitTimeout(_)));
    assert!(matches!(bridge.state(), BridgeState::Failed(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_initialization_is_terminal() {
    let fixture = install_fixture(&silent_module());
    let bridge = WasmFormatter::new(test_config(&fixture));

    assert!(bridge.initialize_bridge().await.is_err());

    // No automatic retry: the second call reports the failure immediately
    // without a new attempt.
    let err = bridge.initialize_bridge().await.unwrap_err();
    assert!(matches!(err, BridgeError::InitFailure(_)));
    assert_eq!(bridge.init_attempts(), 1);

    let err = bridge
        .format_with_editor_config(&request("x"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::InitFailure(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_format_during_loading_window_fails_instead_of_hanging() {
    let fixture = install_fixture(&silent_module());
    let bridge = Arc::new(WasmFormatter::new(test_config(&fixture)));

    let init = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.initialize_bridge().await })
    };

    // Give the initialization a moment to enter the loading state.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let err = bridge
        .format_with_editor_config(&request("x"), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::NotReady | BridgeError::InitFailure(_)
    ));

    assert!(init.await.unwrap().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_module_reported_error_surfaces_as_format_failure() {
    let fixture = install_fixture(&error_module());
    let bridge = WasmFormatter::new(test_config(&fixture));

    bridge.initialize_bridge().await.unwrap();
    let err = bridge
        .format_with_editor_config(&request("x"), None)
        .await
        .unwrap_err();
    match err {
        BridgeError::ModuleFormat(message) => assert_eq!(message, "invalid syntax"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_module_file_fails_initialization() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(crate::bridge::shim::SHIM_FILE),
        crate::bridge::testing::STANDARD_SHIM,
    )
    .unwrap();
    let bridge = WasmFormatter::new(test_config(&dir));

    let err = bridge.initialize_bridge().await.unwrap_err();
    assert!(matches!(err, BridgeError::InitFailure(_)));
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reverse_bridge_round_trip_through_module() {
    let fixture = install_fixture(&exec_module("echo hi"));
    let bridge = WasmFormatter::new(test_config(&fixture));

    bridge.initialize_bridge().await.unwrap();
    let result = bridge
        .format_with_editor_config(&request("ignored"), None)
        .await
        .unwrap();
    assert_eq!(result, "hi\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reverse_bridge_failure_propagates_as_module_error() {
    let fixture = install_fixture(&exec_module("/nonexistent/bridge-tool"));
    let bridge = WasmFormatter::new(test_config(&fixture));

    bridge.initialize_bridge().await.unwrap();
    let err = bridge
        .format_with_editor_config(&request("x"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::ModuleFormat(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stray_finalizer_traps_with_standard_shim() {
    let fixture = install_fixture(&stray_finalizer_module());
    let bridge = WasmFormatter::new(test_config(&fixture));

    bridge.initialize_bridge().await.unwrap();
    let err = bridge
        .format_with_editor_config(&request("x"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::ModuleFormat(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stray_finalizer_tolerated_by_patched_tinygo_shim() {
    let fixture = install_fixture_with_tinygo_shim(&stray_finalizer_module());
    let bridge = WasmFormatter::new(test_config(&fixture));

    bridge.initialize_bridge().await.unwrap();
    let result = bridge
        .format_with_editor_config(&request("a = 1\n"), None)
        .await
        .unwrap();
    assert_eq!(result, "a = 1\n");
}
