/// Lenient construction of value objects from loosely-typed records.
///
/// Counts that are missing or malformed become zero. Identity fields are
/// never invented: a record without them yields `None`.
use serde_json::{Map, Value};
use tracing::debug;

use super::builder::{SearchResultBuilder, numeric, scalar_string};
use super::{GuideDocumentation, SdkDocumentation, SearchResult, validate};
use crate::error::ValidationError;
use crate::uri::{DEFAULT_SCHEME, DocUri};

#[derive(Debug, Clone)]
pub struct DocumentationFactory {
    scheme: String,
}

impl Default for DocumentationFactory {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEME)
    }
}

impl DocumentationFactory {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
        }
    }

    /// A builder that renders URIs under this factory's scheme.
    pub fn search_result_builder(&self) -> SearchResultBuilder {
        SearchResultBuilder::new().with_scheme(self.scheme.clone())
    }

    /// Build a result from a raw record scored on a 0–100 scale.
    ///
    /// The score is divided by 100 and clamped to `[0, 1]`. `chunk_id`,
    /// `sdk`, `score` and `preview` must all be present.
    pub fn create_search_result(&self, raw: &Value) -> Option<SearchResult> {
        let object = raw.as_object()?;
        let chunk_id = scalar_string(object.get("chunk_id"))?;
        let sdk = scalar_string(object.get("sdk"))?;
        let raw_score = object.get("score").filter(|v| !v.is_null())?;
        let preview = scalar_string(object.get("preview"))?;

        let score = numeric(raw_score).unwrap_or(0.0) / 100.0;
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };

        let mut builder = self
            .search_result_builder()
            .with_chunk_id(chunk_id)
            .with_sdk(sdk)
            .with_score(score)
            .with_preview(preview);
        if let Some(Value::Object(metadata)) = object.get("metadata") {
            builder = builder.with_metadata(metadata.clone());
        }
        discard_invalid(builder.build())
    }

    /// Every well-formed result of `raws`, in order.
    pub fn create_search_results(&self, raws: &[Value]) -> Vec<SearchResult> {
        raws.iter()
            .filter_map(|raw| self.create_search_result(raw))
            .collect()
    }

    /// Build an SDK overview from a record carrying `name`, `sections`,
    /// `classes` and `total_chunks`.
    pub fn create_sdk_documentation(&self, sdk: &str, overview: &Value) -> Option<SdkDocumentation> {
        let object = overview.as_object()?;
        let name = scalar_string(object.get("name"))?;
        discard_invalid(self.sdk_documentation(sdk, name, object))
    }

    /// Build a guide overview from a record carrying `name`, `sections` and
    /// `total_chunks`.
    pub fn create_guide_documentation(
        &self,
        guide_type: &str,
        overview: &Value,
    ) -> Option<GuideDocumentation> {
        let object = overview.as_object()?;
        let name = scalar_string(object.get("name"))?;
        discard_invalid(self.guide_documentation(guide_type, name, object))
    }

    /// Overviews for every SDK that `provider` knows about; unknown or
    /// malformed entries are skipped.
    pub fn create_sdk_documentation_list<I, F>(&self, sdks: I, provider: F) -> Vec<SdkDocumentation>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        F: Fn(&str) -> Option<Value>,
    {
        sdks.into_iter()
            .filter_map(|sdk| {
                let sdk = sdk.as_ref();
                provider(sdk).and_then(|overview| self.create_sdk_documentation(sdk, &overview))
            })
            .collect()
    }

    fn sdk_documentation(
        &self,
        sdk: &str,
        name: String,
        object: &Map<String, Value>,
    ) -> Result<SdkDocumentation, ValidationError> {
        let sections = validate::count("sections", count_of(object.get("sections")))?;
        let classes = validate::count("classes", count_of(object.get("classes")))?;
        let chunks = validate::count("chunks", count_of(object.get("total_chunks")))?;
        SdkDocumentation::new(sdk, name, sections, classes, chunks, self.overview_uri(sdk))
    }

    fn guide_documentation(
        &self,
        guide_type: &str,
        name: String,
        object: &Map<String, Value>,
    ) -> Result<GuideDocumentation, ValidationError> {
        let sections = validate::count("sections", count_of(object.get("sections")))?;
        let chunks = validate::count("chunks", count_of(object.get("total_chunks")))?;
        GuideDocumentation::new(guide_type, name, sections, chunks, self.overview_uri(guide_type))
    }

    fn overview_uri(&self, sdk: &str) -> String {
        DocUri::Overview {
            sdk: sdk.to_string(),
        }
        .render(&self.scheme)
    }
}

/// Arrays count their elements, numbers are taken as-is, anything else is 0.
fn count_of(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Array(items)) => items.len() as i64,
        Some(Value::Object(items)) => items.len() as i64,
        Some(other) => numeric(other).map(|n| n.trunc() as i64).unwrap_or(0),
        None => 0,
    }
}

fn discard_invalid<T>(built: Result<T, ValidationError>) -> Option<T> {
    match built {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Discarding invalid record: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(score: Value) -> Value {
        json!({
            "chunk_id": "php_chunk_000001",
            "sdk": "php",
            "score": score,
            "preview": "Client",
        })
    }

    #[test]
    fn test_score_normalization() {
        let factory = DocumentationFactory::default();
        let score = |s: Value| factory.create_search_result(&raw(s)).unwrap().score();

        assert!((score(json!(85.5)) - 0.855).abs() < 1e-9);
        assert_eq!(score(json!(150)), 1.0);
        assert_eq!(score(json!(-50)), 0.0);
        assert_eq!(score(json!("not a number")), 0.0);
    }

    #[test]
    fn test_uri_is_derived() {
        let result = DocumentationFactory::default()
            .create_search_result(&raw(json!(10)))
            .unwrap();
        assert_eq!(result.uri(), "openfga://docs/php/chunk/php_chunk_000001");
    }

    #[test]
    fn test_identity_fields_required() {
        let factory = DocumentationFactory::default();
        for field in ["chunk_id", "sdk", "score", "preview"] {
            let mut record = raw(json!(50));
            record.as_object_mut().unwrap().remove(field);
            assert!(
                factory.create_search_result(&record).is_none(),
                "record without {field} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_records_are_skipped() {
        let factory = DocumentationFactory::default();
        let records = vec![
            raw(json!(50)),
            json!({"chunk_id": "x", "sdk": "Bad Sdk", "score": 1, "preview": "p"}),
            json!("not an object"),
        ];
        let results = factory.create_search_results(&records);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_sdk_documentation_defaults_counts() {
        let factory = DocumentationFactory::default();
        let doc = factory
            .create_sdk_documentation("go", &json!({"name": "Go SDK", "sections": ["A", "B"]}))
            .unwrap();
        assert_eq!(doc.sections(), 2);
        assert_eq!(doc.classes(), 0);
        assert_eq!(doc.chunks(), 0);
        assert_eq!(doc.uri(), "openfga://docs/go");
    }

    #[test]
    fn test_sdk_documentation_rejects() {
        let factory = DocumentationFactory::default();
        assert!(factory.create_sdk_documentation("go", &json!({"sections": []})).is_none());
        assert!(
            factory
                .create_sdk_documentation("go", &json!({"name": "Go", "total_chunks": -3}))
                .is_none()
        );
    }

    #[test]
    fn test_guide_documentation() {
        let factory = DocumentationFactory::new("docs");
        let doc = factory
            .create_guide_documentation(
                "general",
                &json!({"name": "OpenFGA Documentation", "sections": 5, "total_chunks": "12"}),
            )
            .unwrap();
        assert_eq!(doc.sections(), 5);
        assert_eq!(doc.chunks(), 12);
        assert_eq!(doc.uri(), "docs://docs/general");
    }

    #[test]
    fn test_sdk_documentation_list() {
        let factory = DocumentationFactory::default();
        let docs = factory.create_sdk_documentation_list(["php", "go", "rust"], |sdk| match sdk {
            "php" => Some(json!({"name": "PHP SDK", "total_chunks": 3})),
            "go" => Some(json!({"name": "Go SDK"})),
            _ => None,
        });
        let names: Vec<&str> = docs.iter().map(SdkDocumentation::name).collect();
        assert_eq!(names, vec!["PHP SDK", "Go SDK"]);
    }
}
