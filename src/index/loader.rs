/// Where documents come from.
///
/// The index never touches the file system directly; it asks a
/// [`DocumentLoader`] for the raw text of each configured source.
use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// What a document describes, which decides how it is segmented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// SDK reference: `##` sections, source blocks with classes and methods.
    Sdk,
    /// Prose guide: `##` and `###` sections.
    Guide,
}

/// One document the index should load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSource {
    /// Lowercase slug, e.g. `php` or `authoring`.
    pub id: String,
    /// Display name, e.g. `PHP SDK`.
    pub name: String,
    pub kind: DocumentKind,
    /// Location understood by the loader (a path relative to the docs root
    /// for [`FsLoader`]).
    pub file: String,
}

impl DocumentSource {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: DocumentKind,
        file: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            file: file.into(),
        }
    }
}

/// Supplies raw document text.
///
/// Implementations must be `Send + Sync` so an index can be shared across
/// threads behind `Arc`.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, source: &DocumentSource) -> Result<String, LoadError>;
}

/// Reads documents from files under a root directory.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DocumentLoader for FsLoader {
    fn load(&self, source: &DocumentSource) -> Result<String, LoadError> {
        let path = self.root.join(&source.file);
        std::fs::read_to_string(&path).map_err(|source| LoadError::Io { path, source })
    }
}

/// Serves documents held in memory, keyed by document id.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    documents: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, id: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(id, content);
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, content: impl Into<String>) {
        self.documents.insert(id.into(), content.into());
    }
}

impl DocumentLoader for MemoryLoader {
    fn load(&self, source: &DocumentSource) -> Result<String, LoadError> {
        self.documents
            .get(&source.id)
            .cloned()
            .ok_or_else(|| LoadError::Missing {
                id: source.id.clone(),
            })
    }
}
