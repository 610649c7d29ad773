// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use refmt_host::{BridgeConfig, Dispatcher, Document, Engine, Settings};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Maps a file extension to the language identifier an editor would report.
fn language_id_for(path: &Path) -> String {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("proto") => "proto".to_string(),
        Some("hcl") => "hcl".to_string(),
        Some("tf") => "terraform".to_string(),
        Some("tfvars") => "tfvars".to_string(),
        Some("dart") => "dart".to_string(),
        Some("swift") => "swift".to_string(),
        Some("yaml") => "yaml".to_string(),
        Some("yml") => "yml".to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn parse_engine(name: &str) -> Option<Engine> {
    match name {
        "wasm" => Some(Engine::Wasm),
        "go-tool" => Some(Engine::GoTool),
        "go-run" => Some(Engine::GoRun),
        "path" => Some(Engine::Path),
        "local" => Some(Engine::Local),
        _ => None,
    }
}

/// Install directory holding `refmt.wasm` and the shim manifest: the
/// `REFMT_WASM_DIR` override, or `out/` next to the executable.
fn install_dir() -> anyhow::Result<PathBuf> {
    if let Some(dir) = env::var_os("REFMT_WASM_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let exe = env::current_exe()?;
    let exe_dir = exe
        .parent()
        .ok_or_else(|| anyhow::anyhow!("executable has no parent directory"))?;
    Ok(exe_dir.join("out"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <file> [engine]", args[0]);
        eprintln!("Engines: wasm (default), go-tool, go-run, path, local");
        eprintln!("Example: {} main.tf path", args[0]);
        std::process::exit(2);
    }

    let file_path = PathBuf::from(&args[1]);
    let engine = match args.get(2) {
        Some(name) => parse_engine(name)
            .ok_or_else(|| anyhow::anyhow!("unknown engine type: {}", name))?,
        None => Engine::Wasm,
    };

    let settings = Settings {
        engine,
        ..Settings::default()
    };

    let dispatcher = Arc::new(Dispatcher::new(BridgeConfig::new(install_dir()?)));
    dispatcher.startup();

    let content = std::fs::read_to_string(&file_path)?;
    let document = Document {
        language_id: language_id_for(&file_path),
        file_path,
        content,
    };

    match dispatcher.handle(&document, &settings).await {
        Some(formatted) => {
            print!("{}", formatted);
            Ok(())
        }
        None => {
            eprintln!("formatting failed; re-run with RUST_LOG=debug for details");
            std::process::exit(1);
        }
    }
}
