/// Composite chunking: header-aware, size-bounded, fence-preserving.
use super::balance::{FencedChunk, balance_fences};
use super::scan::{char_len, fence_tag, is_fence, parse_header};
use super::simple::chunk_by_size;
use super::{Heading, MIN_CHUNK_SIZE, SmartChunk, SmartMetadata, SmartOptions};

/// Grow chunks along header boundaries while respecting `max_size`.
///
/// A header closes the current chunk once it holds at least
/// `min(MIN_CHUNK_SIZE, max_size / 2)` characters; smaller sections are
/// merged. Outside code, a chunk is cut before the line that would push it
/// past `max_size`. Every chunk has an even number of fences: with
/// `preserve_code_blocks` a block is never cut, otherwise the cut closes the
/// fence and the next chunk reopens it. Chunks left unbalanced by backtick
/// runs inside a line are joined with the chunks after them.
pub fn smart_chunk(content: &str, options: &SmartOptions) -> Vec<SmartChunk> {
    let mut builder = SmartBuilder::new(options);

    for (idx, line) in content.split('\n').enumerate() {
        builder.line_number = idx + 1;
        if builder.fence.is_none()
            && !is_fence(line)
            && parse_header(line).is_none()
            && char_len(line) > builder.max_size
        {
            for piece in chunk_by_size(line, builder.max_size) {
                builder.push_prose(&piece);
            }
        } else {
            builder.push_line(line);
        }
    }

    builder.finish()
}

struct SmartBuilder<'o> {
    options: &'o SmartOptions,
    max_size: usize,
    header_split: usize,
    chunks: Vec<SmartChunk>,
    lines: Vec<String>,
    /// Input line of each entry of `lines`; `None` for lines the builder adds.
    origins: Vec<Option<usize>>,
    /// 1-based input line being consumed.
    line_number: usize,
    size: usize,
    has_body: bool,
    /// Section the scanner is currently in.
    section: Option<Heading>,
    /// Heading recorded in the current chunk's metadata.
    chunk_heading: Option<Heading>,
    /// Info tag of the open fence; `Some("")` for a bare fence.
    fence: Option<String>,
    code_lines: usize,
}

impl<'o> SmartBuilder<'o> {
    fn new(options: &'o SmartOptions) -> Self {
        let max_size = options.max_size.max(1);
        Self {
            options,
            max_size,
            header_split: MIN_CHUNK_SIZE.min(max_size / 2).max(1),
            chunks: Vec::new(),
            lines: Vec::new(),
            origins: Vec::new(),
            line_number: 1,
            size: 0,
            has_body: false,
            section: None,
            chunk_heading: None,
            fence: None,
            code_lines: 0,
        }
    }

    fn push_line(&mut self, line: &str) {
        if self.fence.is_some() {
            self.push_code(line);
        } else if is_fence(line) {
            self.split_for_size(line);
            self.fence = Some(fence_tag(line).unwrap_or_default().to_string());
            self.code_lines = 0;
            self.append(line);
        } else if let Some((level, text)) = parse_header(line) {
            self.push_header(line, level, text);
        } else {
            self.push_prose(line);
        }
    }

    fn push_prose(&mut self, line: &str) {
        self.split_for_size(line);
        self.append(line);
    }

    fn push_header(&mut self, line: &str, level: u8, text: &str) {
        let heading = Heading {
            level,
            text: text.to_string(),
        };
        if self.size >= self.header_split {
            self.flush();
            self.chunk_heading = Some(heading.clone());
        } else if !self.has_body || self.chunk_heading.is_none() {
            self.chunk_heading = Some(heading.clone());
        }
        self.section = Some(heading);
        self.append(line);
    }

    fn push_code(&mut self, line: &str) {
        if is_fence(line) {
            self.fence = None;
            self.append(line);
            return;
        }

        if !self.options.preserve_code_blocks
            && self.code_lines > 0
            && self.size + char_len(line) + 1 > self.max_size
        {
            let tag = self.fence.clone().unwrap_or_default();
            self.append_marker("```");
            self.flush();
            self.continue_section();
            self.append_marker(&format!("```{tag}"));
            self.code_lines = 0;
        }

        self.code_lines += 1;
        self.append(line);
    }

    /// Cut before `line` when it would overflow the current chunk.
    fn split_for_size(&mut self, line: &str) {
        if self.has_body && self.size + char_len(line) + 1 > self.max_size {
            self.flush();
            self.continue_section();
        }
    }

    /// Open the next chunk inside the section the previous one ended in.
    fn continue_section(&mut self) {
        self.chunk_heading = self.section.clone();
        if !self.options.preserve_headers {
            return;
        }
        if let Some(heading) = &self.section {
            let line = format!(
                "{} {} (continued)",
                "#".repeat(usize::from(heading.level)),
                heading.text
            );
            self.push_raw(&line, None);
        }
    }

    /// Add a line taken from the input.
    fn append(&mut self, line: &str) {
        self.push_raw(line, Some(self.line_number));
        if !line.trim().is_empty() {
            self.has_body = true;
        }
    }

    /// Add a fence line that is not part of the input.
    fn append_marker(&mut self, line: &str) {
        self.push_raw(line, None);
        self.has_body = true;
    }

    fn push_raw(&mut self, line: &str, origin: Option<usize>) {
        if !self.lines.is_empty() {
            self.size += 1;
        }
        self.size += char_len(line);
        self.lines.push(line.to_string());
        self.origins.push(origin);
    }

    fn flush(&mut self) {
        let lines = std::mem::take(&mut self.lines);
        let origins = std::mem::take(&mut self.origins);
        let heading = self.chunk_heading.take();
        let had_body = std::mem::replace(&mut self.has_body, false);
        self.size = 0;

        if !had_body {
            return;
        }
        let first_line = first_input_line(&lines, &origins);
        let content = lines.join("\n").trim().to_string();
        let metadata = self.options.include_metadata.then(|| SmartMetadata {
            header: heading.as_ref().map(|h| h.text.clone()),
            header_level: heading.as_ref().map(|h| h.level),
            size: char_len(&content),
            line_count: content.lines().count(),
        });
        self.chunks.push(SmartChunk {
            content,
            metadata,
            first_line,
        });
    }

    fn finish(mut self) -> Vec<SmartChunk> {
        if self.fence.take().is_some() {
            self.append_marker("```");
        }
        self.flush();

        let mut chunks = balance_fences(self.chunks);
        if chunks.is_empty() {
            let metadata = self.options.include_metadata.then(|| SmartMetadata {
                header: None,
                header_level: None,
                size: 0,
                line_count: 0,
            });
            chunks.push(SmartChunk {
                content: String::new(),
                metadata,
                first_line: 1,
            });
        }
        chunks
    }
}

/// Input line that line 1 of the trimmed chunk stands for.
///
/// Lines the builder added before the first input line are counted as if
/// they directly preceded it.
fn first_input_line(lines: &[String], origins: &[Option<usize>]) -> usize {
    let leading_blank = lines.iter().take_while(|l| l.trim().is_empty()).count();
    origins
        .iter()
        .skip(leading_blank)
        .enumerate()
        .find_map(|(offset, origin)| origin.map(|line| line.saturating_sub(offset)))
        .unwrap_or(1)
        .max(1)
}

impl FencedChunk for SmartChunk {
    fn text(&self) -> &str {
        &self.content
    }

    fn text_mut(&mut self) -> &mut String {
        &mut self.content
    }

    /// Join `next`, keeping the blank lines that separated the two in the
    /// input so line positions stay aligned.
    fn absorb(&mut self, next: Self) {
        let end = self.first_line + self.content.split('\n').count();
        let gap = next.first_line.saturating_sub(end);
        self.content.push_str(&"\n".repeat(gap + 1));
        self.content.push_str(&next.content);
        if let Some(metadata) = self.metadata.as_mut() {
            metadata.size = char_len(&self.content);
            metadata.line_count = self.content.lines().count();
        }
    }
}
