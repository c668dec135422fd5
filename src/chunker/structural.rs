/// Structure-driven chunking: headers, source blocks and code fences.
///
/// Each strategy is a small line-scanning state machine. Unterminated
/// constructs run to the end of the document.
use super::balance::{FencedChunk, balance_fences};
use super::scan::{fence_language, is_fence, is_source_end, parse_header, parse_source_start};
use super::{
    BlockChunk, BlockKind, HeaderChunk, Heading, MAX_TEXT_LINES, SourceChunk, SourceKind,
};

/// One chunk per ATX header, holding the header line and its body.
///
/// Headers inside fenced code are ignored. Text before the first header
/// becomes a headerless chunk when it is not blank. Always returns at least
/// one chunk.
pub fn chunk_by_headers(content: &str) -> Vec<HeaderChunk> {
    let mut chunks = Vec::new();
    let mut heading: Option<Heading> = None;
    let mut buffer: Vec<&str> = Vec::new();
    let mut in_code = false;

    for line in content.split('\n') {
        if is_fence(line) {
            in_code = !in_code;
        } else if !in_code {
            if let Some((level, text)) = parse_header(line) {
                flush_header_chunk(&mut chunks, heading.take(), &buffer);
                buffer.clear();
                heading = Some(Heading {
                    level,
                    text: text.to_string(),
                });
            }
        }
        buffer.push(line);
    }
    flush_header_chunk(&mut chunks, heading, &buffer);

    if chunks.is_empty() {
        chunks.push(HeaderChunk {
            content: content.trim().to_string(),
            heading: None,
        });
    }
    chunks
}

fn flush_header_chunk(chunks: &mut Vec<HeaderChunk>, heading: Option<Heading>, lines: &[&str]) {
    let content = lines.join("\n").trim_end().to_string();
    if heading.is_none() && content.trim().is_empty() {
        return;
    }
    chunks.push(HeaderChunk { content, heading });
}

/// Split on `<!-- Source: path -->` / `<!-- End of path -->` markers.
///
/// Marker lines are not part of any chunk. Blank text between blocks is
/// dropped. Always returns at least one chunk.
pub fn chunk_by_source_blocks(content: &str) -> Vec<SourceChunk> {
    let mut chunks = Vec::new();
    let mut source: Option<String> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in content.split('\n') {
        if let Some(path) = parse_source_start(line) {
            flush_source_chunk(&mut chunks, source.take(), &buffer);
            buffer.clear();
            source = Some(path.to_string());
            continue;
        }
        if source.is_some() && is_source_end(line) {
            flush_source_chunk(&mut chunks, source.take(), &buffer);
            buffer.clear();
            continue;
        }
        buffer.push(line);
    }
    flush_source_chunk(&mut chunks, source, &buffer);

    if chunks.is_empty() {
        chunks.push(SourceChunk {
            content: content.trim().to_string(),
            kind: SourceKind::General,
            source: None,
        });
    }
    chunks
}

fn flush_source_chunk(chunks: &mut Vec<SourceChunk>, source: Option<String>, lines: &[&str]) {
    let content = lines.join("\n");
    match source {
        Some(path) => chunks.push(SourceChunk {
            content: content.trim_matches('\n').to_string(),
            kind: SourceKind::SourceBlock,
            source: Some(path),
        }),
        None if !content.trim().is_empty() => chunks.push(SourceChunk {
            content: content.trim_matches('\n').to_string(),
            kind: SourceKind::General,
            source: None,
        }),
        None => {}
    }
}

enum BlockState<'a> {
    Text(Vec<&'a str>),
    Code { language: String, lines: Vec<&'a str> },
}

/// Alternate between fenced code chunks and prose chunks.
///
/// Code chunks keep their fence lines and are never split; an unclosed fence
/// runs to the end of the document and gets a closing fence appended. Prose
/// runs are capped at [`MAX_TEXT_LINES`] lines. A chunk left with an odd
/// number of backtick runs (three backticks quoted mid-sentence) is
/// joined with the following chunks until balanced; a joined chunk that
/// contains code is a code chunk. Always returns at least one chunk.
pub fn chunk_by_code_blocks(content: &str) -> Vec<BlockChunk> {
    let mut chunks = Vec::new();
    let mut state = BlockState::Text(Vec::new());

    for line in content.split('\n') {
        state = match state {
            BlockState::Code {
                language,
                mut lines,
            } => {
                lines.push(line);
                if is_fence(line) {
                    chunks.push(code_chunk(lines.join("\n"), language));
                    BlockState::Text(Vec::new())
                } else {
                    BlockState::Code { language, lines }
                }
            }
            BlockState::Text(mut lines) => {
                if is_fence(line) {
                    flush_text_chunk(&mut chunks, &lines);
                    BlockState::Code {
                        language: fence_language(line),
                        lines: vec![line],
                    }
                } else {
                    lines.push(line);
                    if lines.len() >= MAX_TEXT_LINES {
                        flush_text_chunk(&mut chunks, &lines);
                        lines.clear();
                    }
                    BlockState::Text(lines)
                }
            }
        };
    }

    match state {
        BlockState::Code { language, lines } => {
            let mut body = lines.join("\n");
            body.push_str("\n```");
            chunks.push(code_chunk(body, language));
        }
        BlockState::Text(lines) => flush_text_chunk(&mut chunks, &lines),
    }

    let mut chunks = balance_fences(chunks);
    if chunks.is_empty() {
        chunks.push(BlockChunk {
            content: content.trim().to_string(),
            kind: BlockKind::Text,
            language: None,
        });
    }
    chunks
}

impl FencedChunk for BlockChunk {
    fn text(&self) -> &str {
        &self.content
    }

    fn text_mut(&mut self) -> &mut String {
        &mut self.content
    }

    fn absorb(&mut self, next: Self) {
        self.content.push('\n');
        self.content.push_str(&next.content);
        if self.kind == BlockKind::Text && next.kind == BlockKind::Code {
            self.kind = BlockKind::Code;
            self.language = next.language;
        }
    }
}

fn code_chunk(content: String, language: String) -> BlockChunk {
    BlockChunk {
        content,
        kind: BlockKind::Code,
        language: Some(language),
    }
}

fn flush_text_chunk(chunks: &mut Vec<BlockChunk>, lines: &[&str]) {
    let content = lines.join("\n");
    if content.trim().is_empty() {
        return;
    }
    chunks.push(BlockChunk {
        content: content.trim_matches('\n').to_string(),
        kind: BlockKind::Text,
        language: None,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::scan::count_fences;

    #[test]
    fn test_headers_levels() {
        let chunks = chunk_by_headers("# H1\n## H2\n### H3");
        let levels: Vec<u8> = chunks.iter().filter_map(HeaderChunk::level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
        assert_eq!(chunks[1].header(), Some("H2"));
    }

    #[test]
    fn test_headers_none() {
        let chunks = chunk_by_headers("Just some text.\nMore text.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].header(), None);
    }

    #[test]
    fn test_headers_preamble_and_body() {
        let chunks = chunk_by_headers("Intro line\n\n## Install\nRun it.\n");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "Intro line");
        assert_eq!(chunks[1].content, "## Install\nRun it.");
    }

    #[test]
    fn test_headers_ignored_inside_code() {
        let chunks = chunk_by_headers("# Title\n```bash\n# not a header\n```\nafter");
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].content.contains("# not a header"));
    }

    #[test]
    fn test_headers_empty_content() {
        let chunks = chunk_by_headers("");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "");
    }

    #[test]
    fn test_source_blocks() {
        let content = "Intro\n<!-- Source: src/Client.php -->\n### Client\nbody\n<!-- End of src/Client.php -->\nOutro";
        let chunks = chunk_by_source_blocks(content);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].kind, SourceKind::General);
        assert_eq!(chunks[1].kind, SourceKind::SourceBlock);
        assert_eq!(chunks[1].source.as_deref(), Some("src/Client.php"));
        assert_eq!(chunks[1].content, "### Client\nbody");
        assert_eq!(chunks[2].content, "Outro");
    }

    #[test]
    fn test_source_block_unterminated() {
        let chunks = chunk_by_source_blocks("<!-- Source: a.go -->\nfunc A()\nmore");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, SourceKind::SourceBlock);
        assert_eq!(chunks[0].content, "func A()\nmore");
    }

    #[test]
    fn test_source_blocks_without_markers() {
        let chunks = chunk_by_source_blocks("plain text");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, SourceKind::General);
        assert!(chunks[0].source.is_none());
    }

    #[test]
    fn test_code_blocks_alternate() {
        let content = "Intro\n```php\n$a = 1;\n```\nMiddle\n```js\nlet b;\n```";
        let chunks = chunk_by_code_blocks(content);
        let kinds: Vec<BlockKind> = chunks.iter().map(|c| c.kind).collect();

        assert_eq!(
            kinds,
            vec![BlockKind::Text, BlockKind::Code, BlockKind::Text, BlockKind::Code]
        );
        assert_eq!(chunks[1].language.as_deref(), Some("php"));
        assert_eq!(chunks[3].language.as_deref(), Some("js"));
    }

    #[test]
    fn test_code_block_unclosed_is_closed() {
        let chunks = chunk_by_code_blocks("```python\nprint(1)");
        assert_eq!(chunks.len(), 1);
        assert_eq!(count_fences(&chunks[0].content) % 2, 0);
        assert!(chunks[0].content.contains("print(1)"));
    }

    #[test]
    fn test_long_text_run_is_split() {
        let content = "line\n".repeat(120);
        let chunks = chunk_by_code_blocks(&content);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.kind == BlockKind::Text));
    }

    #[test]
    fn test_mid_line_backticks_join_next_chunk() {
        let content = "Wrap samples in ``` fences.\n\n```php\n$a = 1;\n```";
        let chunks = chunk_by_code_blocks(content);

        for chunk in &chunks {
            assert_eq!(count_fences(&chunk.content) % 2, 0, "{}", chunk.content);
        }
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, BlockKind::Code);
        assert_eq!(chunks[0].language.as_deref(), Some("php"));
        assert!(chunks[0].content.starts_with("Wrap samples"));
    }

    #[test]
    fn test_mid_line_backticks_balanced_by_later_line() {
        let content = "Use ``` to open.\nThen ``` to close.\n```go\nx := 1\n```";
        let chunks = chunk_by_code_blocks(content);
        let kinds: Vec<BlockKind> = chunks.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![BlockKind::Text, BlockKind::Code]);
        assert_eq!(count_fences(&chunks[0].content), 2);
    }

    #[test]
    fn test_code_block_never_split() {
        let body = "x = 1\n".repeat(200);
        let content = format!("```python\n{body}```");
        let chunks = chunk_by_code_blocks(&content);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content.lines().count(), 202);
    }
}
