/// Markdown chunking strategies.
///
/// Every strategy is a pure function of `(content, options)`: no state is kept
/// between calls and malformed input (unclosed fences, stray markers) degrades
/// to "runs to end of document" instead of failing.
///
/// - [`chunk_by_lines`] / [`chunk_by_size`]: fixed windows with overlap
/// - [`chunk_by_headers`]: one chunk per ATX header
/// - [`chunk_by_source_blocks`]: `<!-- Source: ... -->` delimited regions
/// - [`chunk_by_code_blocks`]: alternating code and prose runs
/// - [`smart_chunk`]: header-aware, size-bounded, fence-preserving
/// - [`extract_code_examples`]: fenced blocks with a short description
mod balance;
pub mod examples;
pub mod scan;
pub mod simple;
pub mod smart;
pub mod structural;

use serde::Serialize;

pub use examples::extract_code_examples;
pub use simple::{chunk_by_lines, chunk_by_size};
pub use smart::smart_chunk;
pub use structural::{chunk_by_code_blocks, chunk_by_headers, chunk_by_source_blocks};

/// Default `max_size` for [`smart_chunk`].
pub const DEFAULT_CHUNK_SIZE: usize = 3000;

/// A header chunk only starts a new smart chunk once the current one holds
/// at least this many characters.
pub const MIN_CHUNK_SIZE: usize = 500;

/// Words carried over between size-bounded chunks.
pub const OVERLAP_WORDS: usize = 20;

/// Longest prose run emitted by [`chunk_by_code_blocks`], in lines.
pub const MAX_TEXT_LINES: usize = 50;

// ── Chunk types ──────────────────────────────────────────────────────

/// An ATX header: `level` is the number of leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// Output of [`chunk_by_headers`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderChunk {
    pub content: String,
    /// `None` for the text preceding the first header.
    pub heading: Option<Heading>,
}

impl HeaderChunk {
    pub fn header(&self) -> Option<&str> {
        self.heading.as_ref().map(|h| h.text.as_str())
    }

    pub fn level(&self) -> Option<u8> {
        self.heading.as_ref().map(|h| h.level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    SourceBlock,
    General,
}

/// Output of [`chunk_by_source_blocks`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceChunk {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Code,
    Text,
}

/// Output of [`chunk_by_code_blocks`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockChunk {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    /// Set for code chunks only.
    pub language: Option<String>,
}

/// Knobs for [`smart_chunk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartOptions {
    pub max_size: usize,
    /// Restart a size-split chunk with `<header> (continued)`.
    pub preserve_headers: bool,
    /// Never cut inside a fenced block, even past `max_size`.
    pub preserve_code_blocks: bool,
    pub include_metadata: bool,
}

impl Default for SmartOptions {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_CHUNK_SIZE,
            preserve_headers: true,
            preserve_code_blocks: true,
            include_metadata: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmartMetadata {
    pub header: Option<String>,
    pub header_level: Option<u8>,
    /// Characters in `content`.
    pub size: usize,
    pub line_count: usize,
}

/// Output of [`smart_chunk`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmartChunk {
    pub content: String,
    pub metadata: Option<SmartMetadata>,
    /// 1-based input line that line 1 of `content` corresponds to.
    pub first_line: usize,
}

/// A fenced code block lifted out of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeExample {
    pub language: String,
    pub code: String,
    pub description: Option<String>,
    /// 1-based line of the opening fence.
    pub line_number: usize,
}
