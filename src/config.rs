//! Configuration for the PDF tools
//!
//! Values come from the environment (and a `.env` file loaded by each
//! binary); command-line flags override them.

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Default Chat Completions endpoint root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
/// Default completion model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Document Q&A configuration
#[derive(Debug, Clone)]
pub struct QaConfig {
    /// API key (`OPENAI_API_KEY`)
    pub api_key: Option<String>,
    /// API root, e.g. `https://api.openai.com/v1` (`OPENAI_BASE_URL`)
    pub base_url: String,
    /// Model name (`SUMAI_MODEL`, default: gpt-4o-mini)
    pub model: String,
    /// Request timeout in seconds (`SUMAI_TIMEOUT_SECS`, default: 120)
    pub timeout_secs: u64,
    /// Document characters sent for metadata extraction (default: 30000)
    pub meta_max_chars: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 120,
            meta_max_chars: 30_000,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl QaConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            api_key: non_blank(lookup(API_KEY_VAR)),
            base_url: non_blank(lookup("OPENAI_BASE_URL")).unwrap_or(defaults.base_url),
            model: non_blank(lookup("SUMAI_MODEL")).unwrap_or(defaults.model),
            timeout_secs: non_blank(lookup("SUMAI_TIMEOUT_SECS"))
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            meta_max_chars: defaults.meta_max_chars,
        }
    }

    /// The API key, or `MissingCredential` when unset
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::MissingCredential {
                name: API_KEY_VAR.to_string(),
            })
    }
}

/// Extra directories and paths used when probing for external tools
#[derive(Debug, Clone, Default)]
pub struct ToolPaths {
    /// Ghostscript `bin` candidates (`GHOSTSCRIPT_PATH`, `GS_PATH`)
    pub ghostscript_dirs: Vec<PathBuf>,
    /// Tesseract install candidates (`TESSERACT_PATH`, `TESSERACT_OCR`)
    pub tesseract_dirs: Vec<PathBuf>,
    /// Explicit ocrmypdf executable (`OCRMYPDF_PATH`)
    pub ocrmypdf: Option<PathBuf>,
}

/// Directories named by the given variables, plus their `bin` subdirectories
fn dirs_from<F>(lookup: &F, names: &[&str]) -> Vec<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let mut dirs = Vec::new();
    for name in names {
        if let Some(value) = non_blank(lookup(name)) {
            let path = PathBuf::from(value);
            let bin = path.join("bin");
            if path.is_dir() {
                dirs.push(path);
            }
            if bin.is_dir() {
                dirs.push(bin);
            }
        }
    }
    dirs
}

impl ToolPaths {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            ghostscript_dirs: dirs_from(&lookup, &["GHOSTSCRIPT_PATH", "GS_PATH"]),
            tesseract_dirs: dirs_from(&lookup, &["TESSERACT_PATH", "TESSERACT_OCR"]),
            ocrmypdf: non_blank(lookup("OCRMYPDF_PATH")).map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_qa_defaults() {
        let config = QaConfig::from_lookup(lookup_from(&[]));
        assert!(config.api_key.is_none());
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout_secs, 120);
        assert!(matches!(
            config.require_api_key(),
            Err(Error::MissingCredential { .. })
        ));
    }

    #[test]
    fn test_qa_from_lookup() {
        let config = QaConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
            ("SUMAI_MODEL", "gpt-4o"),
            ("SUMAI_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let config = QaConfig::from_lookup(lookup_from(&[("OPENAI_API_KEY", "   ")]));
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_tool_paths_bin_subdirectory() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("bin")).unwrap();
        let root_str = root.path().to_string_lossy().to_string();

        let paths = ToolPaths::from_lookup(lookup_from(&[
            ("GHOSTSCRIPT_PATH", root_str.as_str()),
            ("TESSERACT_PATH", "/nonexistent/tesseract"),
            ("OCRMYPDF_PATH", "/opt/ocrmypdf/bin/ocrmypdf"),
        ]));
        assert_eq!(
            paths.ghostscript_dirs,
            vec![root.path().to_path_buf(), root.path().join("bin")]
        );
        assert!(paths.tesseract_dirs.is_empty());
        assert_eq!(
            paths.ocrmypdf,
            Some(PathBuf::from("/opt/ocrmypdf/bin/ocrmypdf"))
        );
    }
}
