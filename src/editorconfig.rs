// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Discovery of the nearest `.editorconfig` for a document.
//!
//! The WASM engine receives style configuration as raw text rather than
//! reading the filesystem itself, so the host discovers the nearest
//! applicable file by walking up from the document's directory. Discovery is
//! re-run on every request: configuration files can appear and disappear
//! between edits, and caching here would pin stale settings.

use std::path::{Path, PathBuf};

pub const EDITOR_CONFIG_FILE: &str = ".editorconfig";

/// Returns the path of the nearest `.editorconfig`, searching upward from
/// the file's directory to the filesystem root.
fn nearest_config_file(file_path: &Path) -> Option<PathBuf> {
    let start = file_path.parent()?;
    for dir in start.ancestors() {
        let candidate = dir.join(EDITOR_CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Reads the content of the nearest `.editorconfig` for `file_path`.
///
/// Best-effort: a missing file yields `None`, and an unreadable file is
/// logged and treated as absent rather than failing the format request.
pub fn discover(file_path: &Path) -> Option<String> {
    let config_path = nearest_config_file(file_path)?;
    match std::fs::read_to_string(&config_path) {
        Ok(content) => {
            tracing::debug!(
                "using editorconfig {} for {}",
                config_path.display(),
                file_path.display()
            );
            Some(content)
        }
        Err(e) => {
            tracing::warn!(
                "failed to read editorconfig {}: {}",
                config_path.display(),
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_no_config_found() {
        let root = TempDir::new().unwrap();
        let file = root.path().join("a/b/main.tf");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        assert_eq!(discover(&file), None);
    }

    #[test]
    fn test_nearest_config_wins() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("project/sub");
        std::fs::create_dir_all(&nested).unwrap();

        std::fs::write(
            root.path().join("project").join(EDITOR_CONFIG_FILE),
            "root = true\n",
        )
        .unwrap();
        std::fs::write(
            nested.join(EDITOR_CONFIG_FILE),
            "[*]\nindent_style = tab\n",
        )
        .unwrap();

        let file = nested.join("main.proto");
        std::fs::write(&file, "").unwrap();

        let content = discover(&file).unwrap();
        assert!(content.contains("indent_style = tab"));
        assert!(!content.contains("root = true"));
    }

    #[test]
    fn test_config_in_ancestor_directory() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join(EDITOR_CONFIG_FILE), "[*]\n").unwrap();

        let file = nested.join("x.yaml");
        assert!(discover(&file).is_some());
    }

    #[test]
    fn test_rediscovered_per_call() {
        let root = TempDir::new().unwrap();
        let file = root.path().join("main.hcl");
        std::fs::write(&file, "").unwrap();

        assert_eq!(discover(&file), None);

        std::fs::write(root.path().join(EDITOR_CONFIG_FILE), "[*]\n").unwrap();
        assert!(discover(&file).is_some());
    }
}
