/// Records owned by the index and handed out by reference.
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::loader::DocumentKind;
use crate::models::SearchResult;

/// The addressable unit of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    /// `{sdk}_chunk_{n:06}`, numbered from 1 in document order.
    pub id: String,
    pub sdk: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub prev_chunk_id: Option<String>,
    pub next_chunk_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChunkMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    /// Language of the first fenced block in the chunk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// 1-based document line that the chunk's first line was taken from.
    pub start_line: usize,
    pub line_count: usize,
    pub size_bytes: usize,
}

impl ChunkMetadata {
    /// Structural fields as a JSON map, for search result metadata.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        let fields = [
            ("section", &self.section),
            ("class", &self.class),
            ("method", &self.method),
            ("header", &self.header),
            ("language", &self.language),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        map
    }
}

/// Derived summary of one loaded document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub sdk: String,
    pub name: String,
    pub kind: DocumentKind,
    pub sections: Vec<String>,
    pub classes: Vec<String>,
    pub total_chunks: usize,
    pub source: Option<String>,
    pub generated: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
}

/// Documentation gathered for one class across its source blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDoc {
    pub sdk: String,
    pub name: String,
    pub namespace: Option<String>,
    pub source_file: Option<String>,
    pub content: String,
    /// Method names in document order.
    pub methods: Vec<String>,
    pub chunk_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDoc {
    pub sdk: String,
    pub class: String,
    pub name: String,
    pub content: String,
    pub signature: Option<String>,
    pub parameters: Vec<Parameter>,
    pub returns: Option<String>,
    pub chunk_ids: Vec<String>,
}

/// A code example found in a chunk matching a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeExampleHit {
    pub chunk_id: String,
    pub sdk: String,
    pub language: String,
    pub code: String,
    pub description: Option<String>,
    /// 1-based line of the opening fence in the source document.
    pub line_number: usize,
    pub score: f64,
    pub uri: String,
}

/// A chunk whose key terms overlap those of a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarChunk {
    pub chunk_id: String,
    pub sdk: String,
    /// Jaccard similarity of the two key-term sets.
    pub similarity: f64,
    pub preview: String,
    pub uri: String,
}

/// What a documentation URI points at.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resource", rename_all = "snake_case")]
pub enum Resource<'a> {
    Overview(&'a Overview),
    Section {
        sdk: String,
        section: String,
        chunks: Vec<&'a Chunk>,
    },
    Class(&'a ClassDoc),
    Method(&'a MethodDoc),
    Chunk(&'a Chunk),
    Search {
        query: String,
        results: Vec<SearchResult>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_map_skips_empty_fields() {
        let metadata = ChunkMetadata {
            section: Some("Queries".into()),
            class: Some("Client".into()),
            line_count: 3,
            size_bytes: 40,
            ..ChunkMetadata::default()
        };
        let map = metadata.to_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["class"], "Client");
    }
}
