/// Line classifiers shared by the chunking state machines.
///
/// Every strategy walks the document line by line; these helpers decide what
/// a single line means (fence, header, source marker) without looking at the
/// surrounding state.
use std::sync::LazyLock;

use regex::Regex;

/// Language tag used when a fence carries no info string.
pub const DEFAULT_LANGUAGE: &str = "plaintext";

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})[ \t]+(.*\S)[ \t]*$").unwrap());

static SOURCE_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<!--\s*Source:\s*(.+?)\s*-->\s*$").unwrap());

static SOURCE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*<!--\s*End of\s+.+?\s*-->\s*$").unwrap());

/// Whether `line` opens or closes a fenced code block.
pub fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Language tag of a fence line: the first word of its info string.
pub fn fence_language(line: &str) -> String {
    fence_tag(line)
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}

/// Raw info-string tag of a fence line, `None` for a bare fence.
pub fn fence_tag(line: &str) -> Option<&str> {
    line.trim_start()
        .trim_start_matches('`')
        .split_whitespace()
        .next()
}

/// Parse an ATX header into `(level, text)`.
pub fn parse_header(line: &str) -> Option<(u8, &str)> {
    let caps = HEADER_RE.captures(line)?;
    let level = caps.get(1)?.as_str().len() as u8;
    let text = caps.get(2)?.as_str().trim_end_matches('#').trim_end();
    if text.is_empty() {
        return None;
    }
    Some((level, text))
}

/// Path named by a `<!-- Source: path -->` marker.
pub fn parse_source_start(line: &str) -> Option<&str> {
    SOURCE_START_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Whether `line` is a `<!-- End of path -->` marker.
pub fn is_source_end(line: &str) -> bool {
    SOURCE_END_RE.is_match(line)
}

/// Number of triple-backtick runs in `text`.
pub fn count_fences(text: &str) -> usize {
    text.matches("```").count()
}

/// Split prose into sentences.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace. The terminator
/// stays with its sentence; surrounding whitespace is dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        if let Some(&(next_idx, next)) = chars.peek() {
            if next.is_whitespace() {
                let sentence = text[start..next_idx].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = idx + ch.len_utf8();
            }
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_detection() {
        assert!(is_fence("```php"));
        assert!(is_fence("  ```"));
        assert!(!is_fence("`inline`"));
        assert_eq!(fence_language("```javascript"), "javascript");
        assert_eq!(fence_language("``` go title=x"), "go");
        assert_eq!(fence_language("```"), "plaintext");
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(parse_header("# Title"), Some((1, "Title")));
        assert_eq!(parse_header("###### Deep ##"), Some((6, "Deep")));
        assert_eq!(parse_header("####### Too deep"), None);
        assert_eq!(parse_header("#NoSpace"), None);
        assert_eq!(parse_header("## "), None);
    }

    #[test]
    fn test_source_markers() {
        assert_eq!(
            parse_source_start("<!-- Source: src/Client.php -->"),
            Some("src/Client.php")
        );
        assert!(is_source_end("<!-- End of src/Client.php -->"));
        assert!(!is_source_end("<!-- Source: src/Client.php -->"));
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("One. Two!  Three? Four");
        assert_eq!(sentences, vec!["One.", "Two!", "Three?", "Four"]);
    }

    #[test]
    fn test_split_sentences_keeps_decimals() {
        let sentences = split_sentences("Version 1.5 is out. Upgrade now.");
        assert_eq!(sentences, vec!["Version 1.5 is out.", "Upgrade now."]);
    }
}
