/// Configuration for the documentation engine.
///
/// Handles loading, validating, and providing default configuration values,
/// and resolves which documents the index should load.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::chunker::{DEFAULT_CHUNK_SIZE, SmartOptions};
use crate::index::{DocumentKind, DocumentSource, IndexOptions};
use crate::models::validate;
use crate::uri;

/// Default config file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

const SDK_FILE_SUFFIX: &str = "_SDK.md";

/// Guides recognized by file name during discovery: `(file, id, name)`.
const KNOWN_GUIDES: &[(&str, &str, &str)] = &[
    (
        "AUTHORING_OPENFGA_MODELS.md",
        "authoring",
        "Model Authoring Guide",
    ),
    ("OPENFGA_DOCS.md", "general", "OpenFGA Documentation"),
];

// ── Default value functions ──────────────────────────────────────────

fn default_docs_dir() -> String {
    "./docs".to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_search_limit() -> usize {
    10
}

fn default_uri_scheme() -> String {
    uri::DEFAULT_SCHEME.to_string()
}

fn default_true() -> bool {
    true
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,

    /// Explicit document list. Empty means discover from `docs_dir`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<DocumentSource>,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    #[serde(default = "default_uri_scheme")]
    pub uri_scheme: String,

    #[serde(default = "default_true")]
    pub preserve_headers: bool,

    #[serde(default = "default_true")]
    pub preserve_code_blocks: bool,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            documents: Vec::new(),
            chunk_size: default_chunk_size(),
            search_limit: default_search_limit(),
            uri_scheme: default_uri_scheme(),
            preserve_headers: default_true(),
            preserve_code_blocks: default_true(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to [`DEFAULT_CONFIG_PATH`].
    /// If the file does not exist, returns a default config and, for the
    /// default path only, writes a template file.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            DEFAULT_CONFIG_PATH
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            if path == DEFAULT_CONFIG_PATH {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.chunk_size > 0, "chunk_size must be positive");
        anyhow::ensure!(self.search_limit > 0, "search_limit must be positive");
        anyhow::ensure!(
            uri::is_valid_scheme(&self.uri_scheme),
            "uri_scheme is not a valid URI scheme: {}",
            self.uri_scheme
        );
        for doc in &self.documents {
            validate::slug("documents.id", &doc.id)
                .with_context(|| format!("invalid document id '{}'", doc.id))?;
            anyhow::ensure!(
                !doc.file.trim().is_empty(),
                "document '{}' has no file",
                doc.id
            );
        }
        Ok(())
    }

    /// Chunking and URI options for the index.
    #[must_use]
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            chunking: SmartOptions {
                max_size: self.chunk_size,
                preserve_headers: self.preserve_headers,
                preserve_code_blocks: self.preserve_code_blocks,
                include_metadata: true,
            },
            uri_scheme: self.uri_scheme.clone(),
        }
    }

    /// The documents to load, sorted by id.
    ///
    /// Uses the explicit `documents` list when present; otherwise scans
    /// `docs_dir` for `<LANG>_SDK.md` files and the known guides.
    pub fn document_sources(&self) -> Result<Vec<DocumentSource>> {
        let mut sources = if self.documents.is_empty() {
            discover_documents(Path::new(&self.docs_dir))?
        } else {
            self.documents.clone()
        };
        sources.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sources)
    }
}

// ── Discovery ────────────────────────────────────────────────────────

/// Find SDK references and known guides directly under `dir`.
fn discover_documents(dir: &Path) -> Result<Vec<DocumentSource>> {
    if !dir.is_dir() {
        warn!("Documentation directory not found: {}", dir.display());
        return Ok(Vec::new());
    }

    let pattern = dir.join("*.md");
    let pattern = pattern.to_string_lossy();
    let entries = glob::glob(&pattern).context("invalid glob pattern")?;

    let mut sources = Vec::new();
    for path in entries.flatten() {
        if !path.is_file() {
            continue;
        }
        match classify_file(&path) {
            Some(source) => sources.push(source),
            None => info!("Ignoring unrecognized document {}", path.display()),
        }
    }
    Ok(sources)
}

/// Map a file name to a document source, if it follows a known convention.
fn classify_file(path: &Path) -> Option<DocumentSource> {
    let file_name = path.file_name()?.to_str()?;

    if let Some(&(_, id, name)) = KNOWN_GUIDES.iter().find(|(file, _, _)| *file == file_name) {
        return Some(DocumentSource::new(id, name, DocumentKind::Guide, file_name));
    }

    let language = file_name.strip_suffix(SDK_FILE_SUFFIX)?;
    if language.is_empty() || !language.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    Some(DocumentSource::new(
        language.to_ascii_lowercase(),
        format!("{language} SDK"),
        DocumentKind::Sdk,
        file_name,
    ))
}

/// Resolve `docs_dir` to an absolute path for logging and loaders.
pub fn absolute_docs_dir(config: &Config) -> PathBuf {
    std::path::absolute(Path::new(&config.docs_dir)).unwrap_or_else(|_| PathBuf::from(&config.docs_dir))
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.docs_dir, "./docs");
        assert_eq!(config.chunk_size, 3000);
        assert_eq!(config.search_limit, 10);
        assert_eq!(config.uri_scheme, "openfga");
        assert!(config.documents.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_nonexistent_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config, Config::default());
        assert!(!path.exists(), "template is only written for the default path");
    }

    #[test]
    fn test_load_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"chunk_size": 1200, "uri_scheme": "docs"}"#).unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.chunk_size, 1200);
        assert_eq!(config.uri_scheme, "docs");
        assert_eq!(config.search_limit, 10);
        assert_eq!(config.index_options().chunking.max_size, 1200);
    }

    #[test]
    fn test_load_invalid_json_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.json");
        let config = Config {
            documents: vec![DocumentSource::new(
                "php",
                "PHP SDK",
                DocumentKind::Sdk,
                "PHP_SDK.md",
            )],
            ..Config::default()
        };
        config.save(path.to_str().unwrap()).unwrap();
        let loaded = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            chunk_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            uri_scheme: "not a scheme".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            documents: vec![DocumentSource::new("Go1", "Go", DocumentKind::Sdk, "GO.md")],
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_discovery() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "PHP_SDK.md",
            "GO_SDK.md",
            "AUTHORING_OPENFGA_MODELS.md",
            "OPENFGA_DOCS.md",
            "README.md",
            "notes.txt",
        ] {
            std::fs::write(dir.path().join(name), "# doc").unwrap();
        }

        let config = Config {
            docs_dir: dir.path().to_string_lossy().to_string(),
            ..Config::default()
        };
        let sources = config.document_sources().unwrap();
        let ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["authoring", "general", "go", "php"]);

        let go = sources.iter().find(|s| s.id == "go").unwrap();
        assert_eq!(go.name, "GO SDK");
        assert_eq!(go.kind, DocumentKind::Sdk);
        assert_eq!(go.file, "GO_SDK.md");
    }

    #[test]
    fn test_discovery_missing_dir() {
        let config = Config {
            docs_dir: "/definitely/not/here".to_string(),
            ..Config::default()
        };
        assert!(config.document_sources().unwrap().is_empty());
    }

    #[test]
    fn test_classify_file() {
        assert!(classify_file(Path::new("JAVA_SDK.md")).is_some());
        assert!(classify_file(Path::new("_SDK.md")).is_none());
        assert!(classify_file(Path::new("Java_SDK.md")).is_none());
    }
}
