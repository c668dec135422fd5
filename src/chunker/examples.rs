/// Code example extraction.
use std::sync::LazyLock;

use regex::Regex;

use super::CodeExample;
use super::scan::{fence_language, is_fence, parse_header, split_sentences};

/// How many lines above a fence are searched for a description.
const DESCRIPTION_LOOKBACK: usize = 5;

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:Example|Usage|Sample|Code):\s*(.+)$").unwrap());

/// Every fenced code block in `content`, in document order.
///
/// An unclosed fence yields an example running to the end of the document.
pub fn extract_code_examples(content: &str) -> Vec<CodeExample> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut examples = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        if !is_fence(lines[idx]) {
            idx += 1;
            continue;
        }

        let start = idx;
        let mut end = start + 1;
        while end < lines.len() && !is_fence(lines[end]) {
            end += 1;
        }

        examples.push(CodeExample {
            language: fence_language(lines[start]),
            code: lines[start + 1..end].join("\n"),
            description: describe(&lines, start),
            line_number: start + 1,
        });
        idx = end + 1;
    }

    examples
}

/// Description for the fence at `fence_idx`, taken from the closest
/// paragraph above it.
fn describe(lines: &[&str], fence_idx: usize) -> Option<String> {
    let floor = fence_idx.saturating_sub(DESCRIPTION_LOOKBACK);
    let mut paragraph: Vec<&str> = Vec::new();

    for line in lines[floor..fence_idx].iter().rev() {
        let line = line.trim();
        if is_fence(line) {
            break;
        }
        if line.is_empty() || parse_header(line).is_some() {
            if paragraph.is_empty() {
                continue;
            }
            break;
        }
        paragraph.push(line);
    }

    if paragraph.is_empty() {
        return None;
    }
    paragraph.reverse();
    let text = paragraph.join(" ");

    if let Some(caps) = LABEL_RE.captures(&text) {
        return caps.get(1).map(|m| m.as_str().trim().to_string());
    }
    split_sentences(&text).last().map(|s| s.to_string())
}
