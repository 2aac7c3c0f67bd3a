//! Upload models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Source language of an upload
///
/// `Auto` is only a request to guess; it is resolved to a concrete language
/// before anything is sent to the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Auto,
    C,
    Rust,
    AssemblyScript,
    Wasm,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Auto => "auto",
            Language::C => "c",
            Language::Rust => "rust",
            Language::AssemblyScript => "assemblyscript",
            Language::Wasm => "wasm",
        }
    }

    /// Language implied by a file extension (without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "c" => Some(Language::C),
            "rs" => Some(Language::Rust),
            "ts" => Some(Language::AssemblyScript),
            "wasm" => Some(Language::Wasm),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "auto" => Ok(Language::Auto),
            "c" => Ok(Language::C),
            "rust" => Ok(Language::Rust),
            "assemblyscript" => Ok(Language::AssemblyScript),
            "wasm" => Ok(Language::Wasm),
            _ => Err(format!(
                "Invalid language: {} (expected auto|c|rust|assemblyscript|wasm)",
                s
            )),
        }
    }
}

/// Body of an upload request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Concrete language, never `auto`
    pub lang: Language,

    /// Build options
    pub options: Vec<String>,

    /// Base64 encoded tar archive
    pub tar: String,
}

/// Body of an upload response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub message: String,
}
