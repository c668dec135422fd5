/// Validated value objects returned across the engine boundary.
///
/// Values are only created through constructors that check every invariant,
/// so a `SearchResult` or overview in hand is always well-formed. Use
/// [`SearchResultBuilder`] for fluent construction and
/// [`DocumentationFactory`] for loosely-typed upstream data.
pub mod builder;
pub mod factory;
pub mod validate;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ValidationError;

pub use builder::SearchResultBuilder;
pub use factory::DocumentationFactory;

/// One ranked hit of a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    chunk_id: String,
    sdk: String,
    score: f64,
    preview: String,
    metadata: Map<String, Value>,
    uri: String,
}

impl SearchResult {
    pub fn new(
        chunk_id: impl Into<String>,
        sdk: impl Into<String>,
        score: f64,
        preview: impl Into<String>,
        metadata: Map<String, Value>,
        uri: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let result = Self {
            chunk_id: chunk_id.into(),
            sdk: sdk.into(),
            score,
            preview: preview.into(),
            metadata,
            uri: uri.into(),
        };
        validate::non_empty("chunk_id", &result.chunk_id)?;
        validate::slug("sdk", &result.sdk)?;
        validate::unit_score("score", result.score)?;
        validate::non_empty("preview", &result.preview)?;
        validate::resource_uri(&result.uri)?;
        Ok(result)
    }

    pub fn chunk_id(&self) -> &str {
        &self.chunk_id
    }

    pub fn sdk(&self) -> &str {
        &self.sdk
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// Summary of one SDK reference document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SdkDocumentation {
    sdk: String,
    name: String,
    sections: usize,
    classes: usize,
    chunks: usize,
    uri: String,
}

impl SdkDocumentation {
    pub fn new(
        sdk: impl Into<String>,
        name: impl Into<String>,
        sections: usize,
        classes: usize,
        chunks: usize,
        uri: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let doc = Self {
            sdk: sdk.into(),
            name: name.into(),
            sections,
            classes,
            chunks,
            uri: uri.into(),
        };
        validate::slug("sdk", &doc.sdk)?;
        validate::non_empty("name", &doc.name)?;
        validate::resource_uri(&doc.uri)?;
        Ok(doc)
    }

    pub fn sdk(&self) -> &str {
        &self.sdk
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sections(&self) -> usize {
        self.sections
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// Summary of one prose guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuideDocumentation {
    #[serde(rename = "type")]
    guide_type: String,
    name: String,
    sections: usize,
    chunks: usize,
    uri: String,
}

impl GuideDocumentation {
    pub fn new(
        guide_type: impl Into<String>,
        name: impl Into<String>,
        sections: usize,
        chunks: usize,
        uri: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let doc = Self {
            guide_type: guide_type.into(),
            name: name.into(),
            sections,
            chunks,
            uri: uri.into(),
        };
        validate::slug("type", &doc.guide_type)?;
        validate::non_empty("name", &doc.name)?;
        validate::resource_uri(&doc.uri)?;
        Ok(doc)
    }

    pub fn guide_type(&self) -> &str {
        &self.guide_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sections(&self) -> usize {
        self.sections
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// Either kind of overview, as listed by the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Documentation {
    Sdk(SdkDocumentation),
    Guide(GuideDocumentation),
}
