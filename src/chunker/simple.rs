/// Fixed-window chunking: by line count and by character budget.
use super::OVERLAP_WORDS;
use super::scan::{char_len, split_sentences};

/// Split `content` into windows of `lines_per_chunk` lines.
///
/// Every chunk after the first starts with the last `lines_per_chunk / 2`
/// lines of its predecessor. A window of zero lines is treated as one.
pub fn chunk_by_lines(content: &str, lines_per_chunk: usize) -> Vec<String> {
    let lines: Vec<&str> = content.split('\n').collect();
    let window = lines_per_chunk.max(1);

    if window >= lines.len() {
        return vec![content.to_string()];
    }

    let overlap = window / 2;
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + window).min(lines.len());
        chunks.push(lines[start..end].join("\n"));
        if end == lines.len() {
            break;
        }
        start = end - overlap;
    }

    chunks
}

/// Split `content` into chunks of at most `max_chars` characters along
/// sentence boundaries.
///
/// A new chunk opens with up to [`OVERLAP_WORDS`] trailing words of the
/// previous one so that phrases spanning the cut remain searchable. Cuts
/// only ever fall on whitespace; a single word longer than `max_chars`
/// is kept whole.
pub fn chunk_by_size(content: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let trimmed = content.trim();

    if char_len(trimmed) <= max_chars {
        return vec![trimmed.to_string()];
    }

    let mut pieces = Vec::new();
    for sentence in split_sentences(trimmed) {
        if char_len(sentence) > max_chars {
            pieces.extend(split_words(sentence, max_chars));
        } else {
            pieces.push(sentence.to_string());
        }
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in pieces {
        if !current.is_empty() && char_len(&current) + 1 + char_len(&piece) > max_chars {
            let overlap = trailing_words(&current, OVERLAP_WORDS, max_chars / 4);
            chunks.push(std::mem::take(&mut current));
            if !overlap.is_empty() && char_len(&overlap) + 1 + char_len(&piece) <= max_chars {
                current = overlap;
            }
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&piece);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}

/// Greedily pack the words of `text` into pieces of at most `max_chars`.
fn split_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && char_len(&current) + 1 + char_len(word) > max_chars {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Last `count` words of `text`, dropping leading words until the result
/// fits in `max_chars`.
fn trailing_words(text: &str, count: usize, max_chars: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut tail = &words[words.len().saturating_sub(count)..];

    while !tail.is_empty() && char_len(&tail.join(" ")) > max_chars {
        tail = &tail[1..];
    }
    tail.join(" ")
}
