/// Fluent construction of [`SearchResult`].
use serde_json::{Map, Value};

use super::SearchResult;
use crate::error::ValidationError;
use crate::uri::{DEFAULT_SCHEME, DocUri};

/// Collects fields, then validates them all in [`build`](Self::build).
///
/// When no URI is given, one is derived from the SDK and chunk ID:
/// `scheme://docs/{sdk}/chunk/{chunk_id}`.
#[derive(Debug, Clone)]
pub struct SearchResultBuilder {
    scheme: String,
    chunk_id: Option<String>,
    sdk: Option<String>,
    score: Option<f64>,
    preview: Option<String>,
    metadata: Map<String, Value>,
    uri: Option<String>,
}

impl Default for SearchResultBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchResultBuilder {
    pub fn new() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            chunk_id: None,
            sdk: None,
            score: None,
            preview: None,
            metadata: Map::new(),
            uri: None,
        }
    }

    /// Scheme used for the derived URI.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_chunk_id(mut self, chunk_id: impl Into<String>) -> Self {
        self.chunk_id = Some(chunk_id.into());
        self
    }

    pub fn with_sdk(mut self, sdk: impl Into<String>) -> Self {
        self.sdk = Some(sdk.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }

    /// Replace all metadata.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn add_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Take whatever recognizable fields a JSON object carries.
    ///
    /// Fields of the wrong type are ignored and left unset, so a malformed
    /// record fails in [`build`](Self::build) rather than here. Scores may be
    /// numbers or numeric strings.
    pub fn from_value(mut self, value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return self;
        };
        if let Some(chunk_id) = scalar_string(object.get("chunk_id")) {
            self.chunk_id = Some(chunk_id);
        }
        if let Some(sdk) = scalar_string(object.get("sdk")) {
            self.sdk = Some(sdk);
        }
        if let Some(score) = object.get("score").and_then(numeric) {
            self.score = Some(score);
        }
        if let Some(preview) = scalar_string(object.get("preview")) {
            self.preview = Some(preview);
        }
        if let Some(Value::Object(metadata)) = object.get("metadata") {
            self.metadata = metadata.clone();
        }
        if let Some(uri) = scalar_string(object.get("uri")) {
            self.uri = Some(uri);
        }
        self
    }

    pub fn build(self) -> Result<SearchResult, ValidationError> {
        let chunk_id = self.chunk_id.ok_or(ValidationError::missing("chunk_id"))?;
        let sdk = self.sdk.ok_or(ValidationError::missing("sdk"))?;
        let score = self.score.ok_or(ValidationError::missing("score"))?;
        let preview = self.preview.ok_or(ValidationError::missing("preview"))?;
        let uri = match self.uri {
            Some(uri) => uri,
            None => DocUri::chunk(&sdk, &chunk_id).render(&self.scheme),
        };
        SearchResult::new(chunk_id, sdk, score, preview, self.metadata, uri)
    }
}

/// String form of a JSON scalar; `None` for null, arrays and objects.
pub(crate) fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric value of a JSON number or numeric string.
pub(crate) fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
