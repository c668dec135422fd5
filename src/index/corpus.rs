/// In-memory corpus: every loaded document with its chunks and structure.
use std::collections::HashMap;

use tracing::{debug, warn};

use super::loader::{DocumentKind, DocumentLoader, DocumentSource};
use super::parse::{
    self, ParsedClass, extract_namespace, extract_parameters, extract_returns, extract_signature,
};
use super::provenance::Provenance;
use super::records::{Chunk, ChunkMetadata, ClassDoc, MethodDoc, Overview};
use crate::chunker::scan::fence_language;
use crate::chunker::{SmartOptions, scan, smart_chunk};

pub(crate) struct DocumentEntry {
    pub source: DocumentSource,
    pub overview: Overview,
    pub chunks: Vec<Chunk>,
    /// Section name → indices into `chunks`.
    pub sections: HashMap<String, Vec<usize>>,
    pub classes: Vec<ClassDoc>,
    pub methods: Vec<MethodDoc>,
}

impl DocumentEntry {
    pub fn section_chunks(&self, name: &str) -> Option<&[usize]> {
        self.sections
            .get(name)
            .or_else(|| {
                self.sections
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(Vec::as_slice)
    }

    pub fn class(&self, name: &str) -> Option<&ClassDoc> {
        self.classes
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.classes.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }

    pub fn method(&self, class: &str, name: &str) -> Option<&MethodDoc> {
        let class = self.class(class)?;
        let in_class = |m: &&MethodDoc| m.class == class.name;
        self.methods
            .iter()
            .filter(in_class)
            .find(|m| m.name == name)
            .or_else(|| {
                self.methods
                    .iter()
                    .filter(in_class)
                    .find(|m| m.name.eq_ignore_ascii_case(name))
            })
    }
}

#[derive(Default)]
pub(crate) struct Corpus {
    pub documents: Vec<DocumentEntry>,
    by_sdk: HashMap<String, usize>,
    /// Chunk ID → (document index, chunk index).
    chunk_locations: HashMap<String, (usize, usize)>,
}

impl Corpus {
    /// Load and index every source; sources that fail to load are skipped.
    pub fn build(
        loader: &dyn DocumentLoader,
        sources: &[DocumentSource],
        options: &SmartOptions,
    ) -> Self {
        let mut corpus = Self::default();
        for source in sources {
            if corpus.by_sdk.contains_key(&source.id) {
                warn!("Duplicate document id {}, skipping", source.id);
                continue;
            }
            match loader.load(source) {
                Ok(text) => {
                    let entry = build_document(source.clone(), &text, options);
                    debug!("Indexed {}: {} chunks", source.id, entry.chunks.len());
                    corpus.insert(entry);
                }
                Err(e) => warn!("Skipping document {}: {e}", source.id),
            }
        }
        corpus
    }

    fn insert(&mut self, entry: DocumentEntry) {
        let doc_idx = self.documents.len();
        for (chunk_idx, chunk) in entry.chunks.iter().enumerate() {
            self.chunk_locations
                .insert(chunk.id.clone(), (doc_idx, chunk_idx));
        }
        self.by_sdk.insert(entry.source.id.clone(), doc_idx);
        self.documents.push(entry);
    }

    /// Document registered under exactly `sdk`.
    pub fn document(&self, sdk: &str) -> Option<&DocumentEntry> {
        self.documents.get(*self.by_sdk.get(sdk)?)
    }

    pub fn chunk(&self, id: &str) -> Option<&Chunk> {
        let (doc_idx, chunk_idx) = *self.chunk_locations.get(id)?;
        self.documents.get(doc_idx)?.chunks.get(chunk_idx)
    }

    pub fn total_chunks(&self) -> usize {
        self.documents.iter().map(|d| d.chunks.len()).sum()
    }
}

/// Segment, chunk and summarize one document.
pub(crate) fn build_document(
    source: DocumentSource,
    text: &str,
    options: &SmartOptions,
) -> DocumentEntry {
    let provenance = Provenance::parse(text);
    let parsed = parse::parse_document(text, source.kind);

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut segment_chunks: Vec<Vec<usize>> = Vec::with_capacity(parsed.segments.len());
    let mut sections: HashMap<String, Vec<usize>> = HashMap::new();
    let mut cursor = LineCursor::new(text);

    for segment in &parsed.segments {
        let segment_line = cursor.locate(&segment.content);
        let mut indices = Vec::new();
        for piece in smart_chunk(&segment.content, options) {
            if piece.content.trim().is_empty() {
                continue;
            }
            let idx = chunks.len();
            let (header, header_level) = piece
                .metadata
                .map(|m| (m.header, m.header_level))
                .unwrap_or_default();
            let metadata = ChunkMetadata {
                section: segment.section.clone(),
                class: segment.class.clone(),
                method: segment.method.clone(),
                header,
                header_level,
                source_file: segment.source_file.clone(),
                language: first_language(&piece.content),
                start_line: segment_line + piece.first_line - 1,
                line_count: piece.content.lines().count(),
                size_bytes: piece.content.len(),
            };
            chunks.push(Chunk {
                id: chunk_id(&source.id, idx + 1),
                sdk: source.id.clone(),
                content: piece.content,
                metadata,
                prev_chunk_id: None,
                next_chunk_id: None,
            });
            if let Some(section) = &segment.section {
                sections.entry(section.clone()).or_default().push(idx);
            }
            indices.push(idx);
        }
        segment_chunks.push(indices);
    }
    link_chunks(&mut chunks);

    let ids_for = |segments: &[usize]| -> Vec<String> {
        segments
            .iter()
            .flat_map(|s| segment_chunks[*s].iter())
            .map(|idx| chunks[*idx].id.clone())
            .collect()
    };

    let mut classes = Vec::new();
    let mut methods = Vec::new();
    for class in &parsed.classes {
        classes.push(class_doc(&source, class, ids_for(&class.segments)));
        for method in &class.methods {
            methods.push(MethodDoc {
                sdk: source.id.clone(),
                class: class.name.clone(),
                name: method.name.clone(),
                content: method.content.clone(),
                signature: extract_signature(&method.header, &method.content),
                parameters: extract_parameters(&method.content),
                returns: extract_returns(&method.content),
                chunk_ids: ids_for(&method.segments),
            });
        }
    }

    let overview = Overview {
        sdk: source.id.clone(),
        name: source.name.clone(),
        kind: source.kind,
        sections: parsed.sections.clone(),
        classes: match source.kind {
            DocumentKind::Sdk => classes.iter().map(|c| c.name.clone()).collect(),
            DocumentKind::Guide => Vec::new(),
        },
        total_chunks: chunks.len(),
        generated_at: provenance.generated_at(),
        source: provenance.source,
        generated: provenance.generated,
    };

    DocumentEntry {
        source,
        overview,
        chunks,
        sections,
        classes,
        methods,
    }
}

fn class_doc(source: &DocumentSource, class: &ParsedClass, chunk_ids: Vec<String>) -> ClassDoc {
    let mut method_names: Vec<String> = Vec::new();
    for method in &class.methods {
        if !method_names.contains(&method.name) {
            method_names.push(method.name.clone());
        }
    }
    ClassDoc {
        sdk: source.id.clone(),
        name: class.name.clone(),
        namespace: extract_namespace(&class.content),
        source_file: class.source_file.clone(),
        content: class.content.clone(),
        methods: method_names,
        chunk_ids,
    }
}

/// Finds segments in the document they were cut from.
///
/// Segments come in document order, so the search resumes after the last
/// match and repeated lines resolve to their next occurrence.
struct LineCursor<'t> {
    lines: Vec<&'t str>,
    next: usize,
}

impl<'t> LineCursor<'t> {
    fn new(text: &'t str) -> Self {
        Self {
            lines: text.split('\n').collect(),
            next: 0,
        }
    }

    /// 1-based document line of the first line of `content`.
    fn locate(&mut self, content: &str) -> usize {
        let wanted: Vec<&str> = content.split('\n').map(str::trim).collect();
        let Some(lead) = wanted.iter().position(|l| !l.is_empty()) else {
            return self.next + 1;
        };
        let window = (wanted.len() - lead).min(3);
        let body = &wanted[lead..lead + window];

        let found = (self.next..self.lines.len()).find(|&start| {
            body.iter()
                .enumerate()
                .all(|(i, line)| self.lines.get(start + i).map(|l| l.trim()) == Some(*line))
        });
        match found {
            Some(start) => {
                self.next = start + wanted.len() - lead;
                (start + 1).saturating_sub(lead).max(1)
            }
            None => self.next + 1,
        }
    }
}

pub(crate) fn chunk_id(sdk: &str, n: usize) -> String {
    format!("{sdk}_chunk_{n:06}")
}

fn link_chunks(chunks: &mut [Chunk]) {
    let ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
    for (idx, chunk) in chunks.iter_mut().enumerate() {
        chunk.prev_chunk_id = idx.checked_sub(1).map(|prev| ids[prev].clone());
        chunk.next_chunk_id = ids.get(idx + 1).cloned();
    }
}

fn first_language(content: &str) -> Option<String> {
    content
        .lines()
        .find(|line| scan::is_fence(line))
        .map(fence_language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::loader::MemoryLoader;

    #[test]
    fn test_chunk_id_format() {
        assert_eq!(chunk_id("php", 1), "php_chunk_000001");
        assert_eq!(chunk_id("go", 123456), "go_chunk_123456");
    }

    #[test]
    fn test_chunks_are_linked() {
        let text = "## A\nalpha\n## B\nbeta\n## C\ngamma";
        let source = DocumentSource::new("go", "Go SDK", DocumentKind::Sdk, "");
        let options = SmartOptions {
            max_size: 10,
            ..SmartOptions::default()
        };
        let entry = build_document(source, text, &options);

        assert_eq!(entry.chunks.len(), 3);
        assert_eq!(entry.chunks[0].prev_chunk_id, None);
        assert_eq!(
            entry.chunks[0].next_chunk_id.as_deref(),
            Some("go_chunk_000002")
        );
        assert_eq!(
            entry.chunks[2].prev_chunk_id.as_deref(),
            Some("go_chunk_000002")
        );
        assert_eq!(entry.chunks[2].next_chunk_id, None);
        assert_eq!(entry.section_chunks("b"), Some(&[1][..]));
    }

    #[test]
    fn test_language_metadata() {
        let text = "## Example\n```python\nprint(1)\n```";
        let source = DocumentSource::new("python", "Python SDK", DocumentKind::Sdk, "");
        let entry = build_document(source, text, &SmartOptions::default());
        assert_eq!(entry.chunks[0].metadata.language.as_deref(), Some("python"));
        assert_eq!(entry.chunks[0].metadata.section.as_deref(), Some("Example"));
    }

    #[test]
    fn test_failed_documents_are_skipped() {
        let loader = MemoryLoader::new().with_document("php", "# PHP\nbody");
        let sources = vec![
            DocumentSource::new("php", "PHP SDK", DocumentKind::Sdk, ""),
            DocumentSource::new("go", "Go SDK", DocumentKind::Sdk, ""),
        ];
        let corpus = Corpus::build(&loader, &sources, &SmartOptions::default());

        assert_eq!(corpus.documents.len(), 1);
        assert!(corpus.document("go").is_none());
        assert!(corpus.document("php").is_some());
        assert!(corpus.document("PHP").is_none());
        assert!(corpus.chunk("php_chunk_000001").is_some());
    }

    #[test]
    fn test_start_line_points_into_document() {
        let text = "# Go\n\n## Setup\n\nInstall it.\n\n## Usage\n\nCall it.\n\n## Setup\n\nAgain.";
        let source = DocumentSource::new("go", "Go SDK", DocumentKind::Sdk, "");
        let entry = build_document(source, text, &SmartOptions::default());
        let lines: Vec<&str> = text.split('\n').collect();

        let starts: Vec<usize> = entry.chunks.iter().map(|c| c.metadata.start_line).collect();
        assert!(starts.windows(2).all(|w| w[0] < w[1]), "{starts:?}");
        for chunk in &entry.chunks {
            let first = chunk.content.lines().next().unwrap_or_default();
            assert_eq!(lines[chunk.metadata.start_line - 1].trim(), first.trim());
        }
        assert_eq!(entry.chunks.last().unwrap().metadata.start_line, 11);
    }

    #[test]
    fn test_cursor_skips_past_matched_segments() {
        let mut cursor = LineCursor::new("a\nb\n\na\nc");
        assert_eq!(cursor.locate("a\nb"), 1);
        assert_eq!(cursor.locate("\na\nc"), 3);
        assert_eq!(cursor.locate("missing"), 6);
    }
}
