// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Mapping from editor language identifiers to formatter format types.
//!
//! The mapper is a total function over a fixed table: identifiers the
//! formatter does not know about fall back to [`FormatType::Auto`] so the
//! document still gets a best-effort formatting attempt instead of an error.

use std::fmt::{Display, Formatter};

/// Canonical format identifier understood by every formatting engine.
///
/// The same tag is passed on the command line (`--format <tag>`) and through
/// the WASM bridge's format entry point.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FormatType {
    Proto,
    Hcl,
    Tf,
    Dart,
    Swift,
    Yaml,
    /// Best-effort auto-detection by the engine, used for unknown languages.
    Auto,
}

impl FormatType {
    pub fn as_str(self) -> &'static str {
        match self {
            FormatType::Proto => "proto",
            FormatType::Hcl => "hcl",
            FormatType::Tf => "tf",
            FormatType::Dart => "dart",
            FormatType::Swift => "swift",
            FormatType::Yaml => "yaml",
            FormatType::Auto => "auto",
        }
    }
}

impl Display for FormatType {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language identifiers the dispatcher registers for.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "proto",
    "proto3",
    "protobuf",
    "hcl",
    "hcl2",
    "terraform",
    "tf",
    "tfvars",
    "dart",
    "swift",
    "yaml",
    "yml",
];

/// Maps an editor language identifier to its format type.
///
/// `format_tf_as_hcl` is an explicit user preference to treat the Terraform
/// dialect as its structural HCL superset; it only affects identifiers that
/// map to [`FormatType::Tf`].
pub fn map_format_type(language_id: &str, format_tf_as_hcl: bool) -> FormatType {
    let base = match language_id {
        "proto" | "proto3" | "protobuf" => FormatType::Proto,
        "hcl" | "hcl2" => FormatType::Hcl,
        "terraform" | "tf" | "tfvars" => FormatType::Tf,
        "dart" => FormatType::Dart,
        "swift" => FormatType::Swift,
        "yaml" | "yml" => FormatType::Yaml,
        _ => FormatType::Auto,
    };

    if format_tf_as_hcl && base == FormatType::Tf {
        return FormatType::Hcl;
    }

    base
}
