/// The documentation index.
///
/// Owns every loaded document and answers structural lookups and keyword
/// searches over them. The corpus is built once, on first use, and is
/// immutable afterwards; all reads borrow from it.
///
/// ```no_run
/// use docindex::index::{DocumentationIndex, FsLoader};
/// use docindex::index::{DocumentKind, DocumentSource};
///
/// let sources = vec![DocumentSource::new("php", "PHP SDK", DocumentKind::Sdk, "PHP_SDK.md")];
/// let index = DocumentationIndex::new(FsLoader::new("./docs"), sources);
/// for hit in index.search_chunks("check permission", Some("php"), 5) {
///     println!("{} {:.3}", hit.chunk_id(), hit.score());
/// }
/// ```
mod corpus;
pub mod loader;
mod parse;
pub mod provenance;
pub mod records;
pub mod search;

use std::collections::HashSet;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::chunker::{SmartOptions, extract_code_examples};
use crate::models::{Documentation, DocumentationFactory, SearchResult};
use crate::uri::{DEFAULT_SCHEME, DocUri};
use corpus::Corpus;

pub use loader::{DocumentKind, DocumentLoader, DocumentSource, FsLoader, MemoryLoader};
pub use records::{
    Chunk, ChunkMetadata, ClassDoc, CodeExampleHit, MethodDoc, Overview, Parameter, Resource,
    SimilarChunk,
};
pub use search::{SearchKind, SearchQuery};

/// Hits returned for a `scheme://docs/search/{query}` address.
pub const SEARCH_RESOURCE_LIMIT: usize = 20;

/// Lifecycle of a [`DocumentationIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Tunables for chunking and result rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOptions {
    pub chunking: SmartOptions,
    /// Scheme of generated resource URIs.
    pub uri_scheme: String,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            chunking: SmartOptions::default(),
            uri_scheme: DEFAULT_SCHEME.to_string(),
        }
    }
}

/// In-memory index over a fixed set of documents.
///
/// Construct once and share by reference (or `Arc`). Every read method
/// initializes the index on first use; concurrent first calls block until
/// a single build finishes.
pub struct DocumentationIndex {
    loader: Box<dyn DocumentLoader>,
    sources: Vec<DocumentSource>,
    options: IndexOptions,
    factory: DocumentationFactory,
    building: AtomicBool,
    corpus: OnceLock<Corpus>,
}

impl std::fmt::Debug for DocumentationIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentationIndex")
            .field("sources", &self.sources)
            .field("options", &self.options)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl DocumentationIndex {
    pub fn new(loader: impl DocumentLoader + 'static, sources: Vec<DocumentSource>) -> Self {
        Self::with_options(loader, sources, IndexOptions::default())
    }

    pub fn with_options(
        loader: impl DocumentLoader + 'static,
        sources: Vec<DocumentSource>,
        options: IndexOptions,
    ) -> Self {
        Self {
            loader: Box::new(loader),
            sources,
            factory: DocumentationFactory::new(options.uri_scheme.clone()),
            options,
            building: AtomicBool::new(false),
            corpus: OnceLock::new(),
        }
    }

    pub fn state(&self) -> IndexState {
        if self.corpus.get().is_some() {
            IndexState::Ready
        } else if self.building.load(Ordering::Acquire) {
            IndexState::Initializing
        } else {
            IndexState::Uninitialized
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state() == IndexState::Ready
    }

    /// Load and index every configured document. Idempotent.
    ///
    /// Documents that fail to load are logged and left out; they simply
    /// do not appear in [`get_sdk_list`](Self::get_sdk_list).
    pub fn initialize(&self) {
        self.corpus();
    }

    fn corpus(&self) -> &Corpus {
        self.corpus.get_or_init(|| {
            self.building.store(true, Ordering::Release);
            info!("Initializing documentation index ({} sources)", self.sources.len());
            let corpus = Corpus::build(self.loader.as_ref(), &self.sources, &self.options.chunking);
            info!(
                "Documentation index ready: {} documents, {} chunks",
                corpus.documents.len(),
                corpus.total_chunks()
            );
            self.building.store(false, Ordering::Release);
            corpus
        })
    }

    // ── Structural lookups ───────────────────────────────────────────

    /// IDs of all loaded documents, SDKs and guides, in configured order.
    pub fn get_sdk_list(&self) -> Vec<String> {
        self.corpus()
            .documents
            .iter()
            .map(|d| d.source.id.clone())
            .collect()
    }

    pub fn get_sdk_overview(&self, sdk: &str) -> Option<&Overview> {
        self.corpus().document(sdk).map(|d| &d.overview)
    }

    pub fn get_chunk(&self, chunk_id: &str) -> Option<&Chunk> {
        self.corpus().chunk(chunk_id)
    }

    /// Chunks of a section, in document order. Empty for unknown SDKs or
    /// sections.
    pub fn get_chunks_by_section(&self, sdk: &str, section: &str) -> Vec<&Chunk> {
        let Some(doc) = self.corpus().document(sdk) else {
            return Vec::new();
        };
        doc.section_chunks(section)
            .map(|indices| indices.iter().map(|idx| &doc.chunks[*idx]).collect())
            .unwrap_or_default()
    }

    /// All chunks of one document, in order.
    pub fn get_document_chunks(&self, sdk: &str) -> &[Chunk] {
        self.corpus()
            .document(sdk)
            .map(|d| d.chunks.as_slice())
            .unwrap_or_default()
    }

    pub fn get_class_documentation(&self, sdk: &str, class: &str) -> Option<&ClassDoc> {
        self.corpus().document(sdk)?.class(class)
    }

    pub fn get_method_documentation(
        &self,
        sdk: &str,
        class: &str,
        method: &str,
    ) -> Option<&MethodDoc> {
        self.corpus().document(sdk)?.method(class, method)
    }

    /// What a `scheme://docs/...` URI points at, if it exists.
    ///
    /// A search address always resolves, with the top
    /// [`SEARCH_RESOURCE_LIMIT`] hits across every document.
    pub fn resolve(&self, uri: &str) -> Option<Resource<'_>> {
        let (_, address) = DocUri::parse(uri)?;
        if let DocUri::Search { query } = address {
            let results = self.search_chunks(&query, None, SEARCH_RESOURCE_LIMIT);
            return Some(Resource::Search { query, results });
        }
        let doc = self.corpus().document(address.sdk()?)?;
        let resource = match address {
            DocUri::Overview { .. } => Resource::Overview(&doc.overview),
            DocUri::Section { sdk, section } => {
                let indices = doc.section_chunks(&section)?;
                Resource::Section {
                    sdk,
                    section,
                    chunks: indices.iter().map(|idx| &doc.chunks[*idx]).collect(),
                }
            }
            DocUri::Class { class, .. } => Resource::Class(doc.class(&class)?),
            DocUri::Method { class, method, .. } => Resource::Method(doc.method(&class, &method)?),
            DocUri::Chunk { chunk_id, .. } => {
                let chunk = self.corpus().chunk(&chunk_id)?;
                if chunk.sdk != doc.source.id {
                    return None;
                }
                Resource::Chunk(chunk)
            }
            DocUri::Search { .. } => return None,
        };
        Some(resource)
    }

    /// Validated overviews of every loaded document.
    pub fn list_documentation(&self) -> Vec<Documentation> {
        self.corpus()
            .documents
            .iter()
            .filter_map(|doc| {
                let raw = serde_json::to_value(&doc.overview).ok()?;
                match doc.source.kind {
                    DocumentKind::Sdk => self
                        .factory
                        .create_sdk_documentation(&doc.source.id, &raw)
                        .map(Documentation::Sdk),
                    DocumentKind::Guide => self
                        .factory
                        .create_guide_documentation(&doc.source.id, &raw)
                        .map(Documentation::Guide),
                }
            })
            .collect()
    }

    // ── Search ───────────────────────────────────────────────────────

    /// Keyword search over chunk text; see [`search`](mod@search) for
    /// scoring.
    pub fn search_chunks(&self, query: &str, sdk: Option<&str>, limit: usize) -> Vec<SearchResult> {
        let mut request = SearchQuery::new(query).limit(limit);
        request.sdk = sdk.map(str::to_string);
        self.search(&request)
    }

    pub fn search(&self, request: &SearchQuery) -> Vec<SearchResult> {
        let hits = search::rank(
            self.scan(request.sdk.as_deref()),
            &request.query,
            request.kind,
        );
        hits.into_iter()
            .skip(request.offset)
            .filter_map(|(score, chunk)| self.to_result(score, chunk, &request.query))
            .take(request.limit)
            .collect()
    }

    /// Code examples inside chunks matching `query`, optionally restricted
    /// to one language (aliases such as `js` and `javascript` match).
    ///
    /// Examples are listed in ranking order; the first `offset` are skipped
    /// and at most `limit` returned. Line numbers refer to the source
    /// document.
    pub fn search_code_examples(
        &self,
        query: &str,
        sdk: Option<&str>,
        language: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Vec<CodeExampleHit> {
        let wanted = language.map(search::canonical_language);
        let hits = search::rank(self.scan(sdk), query, SearchKind::Content);

        hits.into_iter()
            .flat_map(|(score, chunk)| {
                extract_code_examples(&chunk.content)
                    .into_iter()
                    .map(move |example| (score, chunk, example))
            })
            .filter(|(_, _, example)| {
                wanted
                    .as_deref()
                    .is_none_or(|lang| search::canonical_language(&example.language) == lang)
            })
            .skip(offset)
            .take(limit)
            .map(|(score, chunk, example)| CodeExampleHit {
                chunk_id: chunk.id.clone(),
                sdk: chunk.sdk.clone(),
                language: example.language,
                code: example.code,
                description: example.description,
                line_number: chunk.metadata.start_line + example.line_number - 1,
                score,
                uri: self.chunk_uri(chunk),
            })
            .collect()
    }

    /// Chunks sharing key terms with `content`, by Jaccard similarity of
    /// their key-term sets. Only similarities of at least `threshold` are
    /// returned.
    pub fn find_similar(
        &self,
        content: &str,
        sdk: Option<&str>,
        threshold: f64,
        limit: usize,
    ) -> Vec<SimilarChunk> {
        let terms = search::key_terms(content);
        if terms.is_empty() {
            return Vec::new();
        }
        let wanted: HashSet<String> = terms.iter().cloned().collect();

        let mut similar: Vec<SimilarChunk> = self
            .scan(sdk)
            .filter(|chunk| {
                let lower = chunk.content.to_lowercase();
                terms.iter().any(|t| lower.contains(t.as_str()))
            })
            .filter_map(|chunk| {
                let candidate: HashSet<String> =
                    search::key_terms(&chunk.content).into_iter().collect();
                let similarity = search::jaccard(&wanted, &candidate);
                (similarity > 0.0 && similarity >= threshold).then(|| SimilarChunk {
                    chunk_id: chunk.id.clone(),
                    sdk: chunk.sdk.clone(),
                    similarity,
                    preview: search::preview(&chunk.content, &terms[0]),
                    uri: self.chunk_uri(chunk),
                })
            })
            .collect();

        similar.sort_by(|a, b| {
            search::compare_hits(a.similarity, &a.chunk_id, b.similarity, &b.chunk_id)
        });
        similar.truncate(limit);
        similar
    }

    /// Chunks to scan: one document when `sdk` is given, otherwise all.
    fn scan<'a>(&'a self, sdk: Option<&str>) -> Box<dyn Iterator<Item = &'a Chunk> + 'a> {
        let corpus = self.corpus();
        match sdk {
            Some(sdk) => match corpus.document(sdk) {
                Some(doc) => Box::new(doc.chunks.iter()),
                None => Box::new(std::iter::empty()),
            },
            None => Box::new(corpus.documents.iter().flat_map(|d| d.chunks.iter())),
        }
    }

    fn chunk_uri(&self, chunk: &Chunk) -> String {
        DocUri::chunk(&chunk.sdk, &chunk.id).render(&self.options.uri_scheme)
    }

    fn to_result(&self, score: f64, chunk: &Chunk, query: &str) -> Option<SearchResult> {
        let mut metadata = chunk.metadata.to_map();
        if let Some(next) = &chunk.next_chunk_id {
            metadata.insert("next_chunk_id".to_string(), Value::String(next.clone()));
        }
        let built = self
            .factory
            .search_result_builder()
            .with_chunk_id(chunk.id.clone())
            .with_sdk(chunk.sdk.clone())
            .with_score(score)
            .with_preview(search::preview(&chunk.content, query))
            .with_metadata(metadata)
            .build();
        match built {
            Ok(result) => Some(result),
            Err(e) => {
                debug!("Dropping search hit {}: {e}", chunk.id);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> Vec<DocumentSource> {
        vec![
            DocumentSource::new("php", "PHP SDK", DocumentKind::Sdk, "PHP_SDK.md"),
            DocumentSource::new("authoring", "Model Authoring Guide", DocumentKind::Guide, "A.md"),
        ]
    }

    fn index() -> DocumentationIndex {
        let loader = MemoryLoader::new()
            .with_document(
                "php",
                "# PHP SDK\n\n## Usage\n\nCall check to test a permission.\n\n\
                 <!-- Source: src/Client.php -->\n### Client\n\n##### check\n\n\
                 Check permission.\n\n```php\n$client->check($tuple);\n```\n\
                 <!-- End of src/Client.php -->",
            )
            .with_document(
                "authoring",
                "# Authoring\n\n## Types\n\nDefine a type.\n\n### Relations\n\nA relation links users.",
            );
        DocumentationIndex::new(loader, sources())
    }

    #[test]
    fn test_lazy_initialization() {
        let index = index();
        assert_eq!(index.state(), IndexState::Uninitialized);
        assert_eq!(index.get_sdk_list(), vec!["php", "authoring"]);
        assert!(index.is_initialized());
    }

    #[test]
    fn test_structural_lookups() {
        let index = index();
        let overview = index.get_sdk_overview("php").unwrap();
        assert_eq!(overview.classes, vec!["Client"]);
        assert_eq!(overview.sections, vec!["Usage"]);

        let class = index.get_class_documentation("php", "client").unwrap();
        assert_eq!(class.methods, vec!["check"]);
        let method = index.get_method_documentation("php", "Client", "check").unwrap();
        assert_eq!(method.signature.as_deref(), Some("$client->check($tuple);"));

        assert!(index.get_class_documentation("php", "Missing").is_none());
        assert!(index.get_sdk_overview("rust").is_none());
        assert!(index.get_chunk("php_chunk_999999").is_none());
        assert!(index.get_chunks_by_section("php", "Nope").is_empty());
        assert!(!index.get_chunks_by_section("authoring", "Relations").is_empty());
    }

    #[test]
    fn test_search_respects_filter() {
        let index = index();
        let results = index.search_chunks("permission", Some("php"), 10);
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.sdk() == "php"));
        assert!(index.search_chunks("permission", Some("authoring"), 10).is_empty());
        assert!(index.search_chunks("permission", Some("unknown"), 10).is_empty());
    }

    #[test]
    fn test_search_kind_and_offset() {
        let index = index();
        let methods = index.search(&SearchQuery::new("check").kind(SearchKind::Method));
        assert!(!methods.is_empty());
        assert!(methods.iter().all(|r| r.metadata()["method"] == "check"));

        let all = index.search(&SearchQuery::new("check"));
        let skipped = index.search(&SearchQuery::new("check").offset(1));
        assert_eq!(skipped.len(), all.len() - 1);
        assert_eq!(skipped[0], all[1]);
    }

    #[test]
    fn test_code_example_search() {
        let index = index();
        let hits = index.search_code_examples("check", None, Some("PHP"), 5, 0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "$client->check($tuple);");
        assert_eq!(hits[0].line_number, 14);
        assert!(index.search_code_examples("check", None, Some("go"), 5, 0).is_empty());
        assert!(index.search_code_examples("check", None, Some("php"), 5, 1).is_empty());
    }

    #[test]
    fn test_sdk_filter_requires_exact_slug() {
        let index = index();
        assert!(!index.search_chunks("check", Some("php"), 10).is_empty());
        assert!(index.search_chunks("check", Some("PHP"), 10).is_empty());
        assert!(index.get_sdk_overview("PHP").is_none());
    }

    #[test]
    fn test_find_similar() {
        let index = index();
        let similar = index.find_similar("relation links users", None, 0.1, 5);
        assert_eq!(similar[0].sdk, "authoring");
        assert!(similar.iter().all(|s| s.similarity >= 0.1));
        assert!(index.find_similar("the and for", None, 0.0, 5).is_empty());
    }

    #[test]
    fn test_resolve() {
        let index = index();
        assert!(matches!(
            index.resolve("openfga://docs/php"),
            Some(Resource::Overview(_))
        ));
        assert!(matches!(
            index.resolve("openfga://docs/php/method/Client/check"),
            Some(Resource::Method(_))
        ));
        assert!(matches!(
            index.resolve("openfga://docs/php/chunk/php_chunk_000001"),
            Some(Resource::Chunk(_))
        ));
        assert!(index.resolve("openfga://docs/authoring/chunk/php_chunk_000001").is_none());
        assert!(index.resolve("openfga://docs/php/class/Nope").is_none());
    }

    #[test]
    fn test_resolve_search_address() {
        let index = index();
        match index.resolve("openfga://docs/search/relation%20links") {
            Some(Resource::Search { query, results }) => {
                assert_eq!(query, "relation links");
                assert!(!results.is_empty());
                assert!(results.iter().any(|r| r.sdk() == "authoring"));
            }
            other => panic!("expected search results, got {other:?}"),
        }
        assert!(matches!(
            index.resolve("openfga://docs/search/zzzzqx"),
            Some(Resource::Search { results, .. }) if results.is_empty()
        ));
    }

    #[test]
    fn test_list_documentation() {
        let index = index();
        let docs = index.list_documentation();
        assert_eq!(docs.len(), 2);
        match &docs[0] {
            Documentation::Sdk(doc) => {
                assert_eq!(doc.classes(), 1);
                assert_eq!(doc.uri(), "openfga://docs/php");
            }
            other => panic!("expected SDK documentation, got {other:?}"),
        }
        assert!(matches!(docs[1], Documentation::Guide(_)));
    }
}
