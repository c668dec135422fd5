/// Keyword relevance scoring and the helpers around it.
///
/// Scoring for a query split into lowercase terms `t`:
///
/// ```text
/// raw   = coverage * Σ_t ( tf_t / (1 + words / 200)
///                          + 5·[t in class] + 3·[t in method]
///                          + 2·[t in section] + 2·[t in header] )
///       + 3·[whole query appears verbatim]     (multi-term queries only)
/// score = raw / (raw + 4)
/// ```
///
/// `tf_t` counts case-insensitive occurrences in the chunk text, capped at
/// [`MAX_TERM_FREQUENCY`]; `coverage` is the fraction of terms found in the
/// text or metadata. Chunks matching no term are not scored.
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use serde::Serialize;

use super::records::Chunk;

pub const MAX_TERM_FREQUENCY: usize = 20;
const CLASS_BOOST: f64 = 5.0;
const METHOD_BOOST: f64 = 3.0;
const SECTION_BOOST: f64 = 2.0;
const HEADER_BOOST: f64 = 2.0;
const PHRASE_BONUS: f64 = 3.0;
const SATURATION: f64 = 4.0;
const LENGTH_PIVOT: f64 = 200.0;

const PREVIEW_LEAD: usize = 50;
const PREVIEW_LENGTH: usize = 200;

/// Key terms kept per text for similarity.
const KEY_TERMS: usize = 10;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "have", "this", "that", "with", "from", "they", "will", "would",
    "there", "their", "what", "which", "when", "where", "who", "how", "into", "than", "then",
    "them", "these", "those", "its", "also", "been", "were", "being", "use", "using", "used",
    "your", "may", "each", "other", "such", "only", "some", "more", "most", "very", "should",
    "could", "does", "did", "about", "over", "after", "before", "via", "per",
];

/// Which part of a chunk a search is about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    /// Any chunk whose text matches.
    #[default]
    Content,
    /// Only chunks inside a class whose name contains the query.
    Class,
    /// Only chunks inside a method whose name contains the query.
    Method,
    /// Only chunks inside a section whose name contains the query.
    Section,
}

impl FromStr for SearchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "content" | "all" => Ok(Self::Content),
            "class" => Ok(Self::Class),
            "method" => Ok(Self::Method),
            "section" => Ok(Self::Section),
            other => Err(format!("unknown search kind '{other}'")),
        }
    }
}

impl SearchKind {
    fn accepts(self, chunk: &Chunk, query: &str) -> bool {
        let field = match self {
            Self::Content => return true,
            Self::Class => &chunk.metadata.class,
            Self::Method => &chunk.metadata.method,
            Self::Section => &chunk.metadata.section,
        };
        field
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(query))
    }
}

/// A keyword query with paging and an optional document filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    /// Restrict the scan to one document.
    pub sdk: Option<String>,
    pub limit: usize,
    pub offset: usize,
    pub kind: SearchKind,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            sdk: None,
            limit: 10,
            offset: 0,
            kind: SearchKind::Content,
        }
    }

    pub fn sdk(mut self, sdk: impl Into<String>) -> Self {
        self.sdk = Some(sdk.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn kind(mut self, kind: SearchKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Lowercase whitespace-separated terms, duplicates removed.
pub(crate) fn tokenize(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

/// Score every chunk of `chunks` against `query`, best first.
///
/// Ties are broken by chunk ID so repeated queries return the same order.
pub(crate) fn rank<'c>(
    chunks: impl Iterator<Item = &'c Chunk>,
    query: &str,
    kind: SearchKind,
) -> Vec<(f64, &'c Chunk)> {
    let terms = tokenize(query);
    if terms.is_empty() {
        return Vec::new();
    }
    let normalized = terms.join(" ");
    let phrase = (terms.len() > 1).then_some(normalized.as_str());

    let mut hits: Vec<(f64, &Chunk)> = chunks
        .filter(|chunk| kind.accepts(chunk, &normalized))
        .filter_map(|chunk| score_chunk(chunk, &terms, phrase).map(|score| (score, chunk)))
        .collect();
    hits.sort_by(|a, b| compare_hits(a.0, &a.1.id, b.0, &b.1.id));
    hits
}

/// Descending score, then ascending ID.
pub(crate) fn compare_hits(score_a: f64, id_a: &str, score_b: f64, id_b: &str) -> Ordering {
    score_b.total_cmp(&score_a).then_with(|| id_a.cmp(id_b))
}

pub(crate) fn score_chunk(chunk: &Chunk, terms: &[String], phrase: Option<&str>) -> Option<f64> {
    let content = chunk.content.to_lowercase();
    let words = content.split_whitespace().count() as f64;
    let length_norm = 1.0 + words / LENGTH_PIVOT;

    let lower = |field: &Option<String>| field.as_deref().map(str::to_lowercase);
    let class = lower(&chunk.metadata.class);
    let method = lower(&chunk.metadata.method);
    let section = lower(&chunk.metadata.section);
    let header = lower(&chunk.metadata.header);
    let contains = |field: &Option<String>, term: &str| {
        field.as_deref().is_some_and(|value| value.contains(term))
    };

    let mut matched = 0usize;
    let mut raw = 0.0;
    for term in terms {
        let frequency = content.matches(term.as_str()).count().min(MAX_TERM_FREQUENCY);
        let mut boost = 0.0;
        if contains(&class, term) {
            boost += CLASS_BOOST;
        }
        if contains(&method, term) {
            boost += METHOD_BOOST;
        }
        if contains(&section, term) {
            boost += SECTION_BOOST;
        }
        if contains(&header, term) {
            boost += HEADER_BOOST;
        }
        if frequency > 0 || boost > 0.0 {
            matched += 1;
        }
        raw += frequency as f64 / length_norm + boost;
    }

    if matched == 0 {
        return None;
    }
    raw *= matched as f64 / terms.len() as f64;
    if phrase.is_some_and(|p| content.contains(p)) {
        raw += PHRASE_BONUS;
    }
    Some(raw / (raw + SATURATION))
}

/// Up to [`PREVIEW_LENGTH`] characters around the first match, with `...`
/// marking truncated ends.
pub(crate) fn preview(content: &str, query: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let folded = fold(content);
    let needle = fold(query.trim());

    let position = find_chars(&folded, &needle)
        .or_else(|| {
            query
                .split_whitespace()
                .find_map(|term| find_chars(&folded, &fold(term)))
        })
        .unwrap_or(0);

    let start = position.saturating_sub(PREVIEW_LEAD);
    let end = (start + PREVIEW_LENGTH).min(chars.len());
    let snippet: String = chars[start..end].iter().collect();
    let snippet = snippet.trim();

    let mut preview = String::new();
    if start > 0 {
        preview.push_str("...");
    }
    preview.push_str(snippet);
    if end < chars.len() {
        preview.push_str("...");
    }
    preview
}

/// One lowercase char per input char, so indices line up with the source.
fn fold(text: &str) -> Vec<char> {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// The most frequent meaningful words of `text`, code blocks excluded.
pub(crate) fn key_terms(text: &str) -> Vec<String> {
    let mut in_code = false;
    let mut prose = String::new();
    for line in text.lines() {
        if crate::chunker::scan::is_fence(line) {
            in_code = !in_code;
            continue;
        }
        if !in_code {
            prose.push_str(line);
            prose.push(' ');
        }
    }

    let cleaned: String = prose
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, word) in cleaned.split_whitespace().enumerate() {
        if word.chars().count() <= 2 || STOP_WORDS.contains(&word) {
            continue;
        }
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> =
        counts.into_iter().map(|(w, (n, first))| (w, n, first)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(KEY_TERMS)
        .map(|(word, _, _)| word.to_string())
        .collect()
}

/// `|a ∩ b| / |a ∪ b|`, zero when both are empty.
pub(crate) fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Canonical spelling of a code-fence language tag.
pub(crate) fn canonical_language(language: &str) -> String {
    let lower = language.trim().to_ascii_lowercase();
    let canonical = match lower.as_str() {
        "js" | "node" => "javascript",
        "ts" => "typescript",
        "py" | "python3" => "python",
        "cs" | "c#" | "dotnet" => "csharp",
        "golang" => "go",
        "sh" | "shell" | "zsh" => "bash",
        "yml" => "yaml",
        _ => return lower,
    };
    canonical.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::records::ChunkMetadata;

    fn chunk(id: &str, content: &str, class: Option<&str>) -> Chunk {
        Chunk {
            id: id.to_string(),
            sdk: "php".to_string(),
            content: content.to_string(),
            metadata: ChunkMetadata {
                class: class.map(str::to_string),
                ..ChunkMetadata::default()
            },
            prev_chunk_id: None,
            next_chunk_id: None,
        }
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Check  check Tuple"), vec!["check", "tuple"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_score_bounds_and_misses() {
        let c = chunk("php_chunk_000001", "Check a tuple. Check again.", None);
        let terms = tokenize("check");
        let score = score_chunk(&c, &terms, None).unwrap();
        assert!(score > 0.0 && score < 1.0);
        assert!(score_chunk(&c, &tokenize("xyz-no-such-token"), None).is_none());
    }

    #[test]
    fn test_class_boost_ranks_higher() {
        let plain = chunk("php_chunk_000001", "the client sends requests", None);
        let boosted = chunk("php_chunk_000002", "the client sends requests", Some("Client"));
        let hits = rank([&plain, &boosted].into_iter(), "client", SearchKind::Content);
        assert_eq!(hits[0].1.id, "php_chunk_000002");
    }

    #[test]
    fn test_ties_break_by_id() {
        let b = chunk("php_chunk_000002", "write tuples", None);
        let a = chunk("php_chunk_000001", "write tuples", None);
        let hits = rank([&b, &a].into_iter(), "write", SearchKind::Content);
        let ids: Vec<&str> = hits.iter().map(|(_, c)| c.id.as_str()).collect();
        assert_eq!(ids, vec!["php_chunk_000001", "php_chunk_000002"]);
    }

    #[test]
    fn test_partial_coverage_scores_lower() {
        let both = chunk("php_chunk_000001", "list objects in a store", None);
        let one = chunk("php_chunk_000002", "list stores and more stores", None);
        let terms = tokenize("list objects");
        let full = score_chunk(&both, &terms, Some("list objects")).unwrap();
        let partial = score_chunk(&one, &terms, Some("list objects")).unwrap();
        assert!(full > partial);
    }

    #[test]
    fn test_kind_filter() {
        let c = chunk("php_chunk_000001", "check", Some("Client"));
        assert!(SearchKind::Class.accepts(&c, "client"));
        assert!(!SearchKind::Method.accepts(&c, "client"));
        assert_eq!("METHOD".parse::<SearchKind>(), Ok(SearchKind::Method));
        assert!("bogus".parse::<SearchKind>().is_err());
    }

    #[test]
    fn test_preview_window() {
        let content = format!("{}needle{}", "a".repeat(100), "b".repeat(300));
        let p = preview(&content, "NEEDLE");
        assert!(p.starts_with("..."));
        assert!(p.ends_with("..."));
        assert!(p.contains("needle"));
        assert_eq!(p.chars().count(), PREVIEW_LENGTH + 6);
    }

    #[test]
    fn test_preview_short_content() {
        assert_eq!(preview("Short text", "text"), "Short text");
    }

    #[test]
    fn test_key_terms_skip_code_and_stop_words() {
        let terms = key_terms("The store store model.\n```php\nsecret_code()\n```\nModel for the store.");
        assert_eq!(terms[0], "store");
        assert_eq!(terms[1], "model");
        assert!(!terms.iter().any(|t| t.contains("secret")));
        assert!(!terms.contains(&"the".to_string()));
    }

    #[test]
    fn test_jaccard() {
        let a: HashSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let b: HashSet<String> = ["b", "c"].iter().map(|s| s.to_string()).collect();
        assert!((jaccard(&a, &b) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(jaccard(&HashSet::new(), &HashSet::new()), 0.0);
    }

    #[test]
    fn test_canonical_language() {
        assert_eq!(canonical_language("JS"), "javascript");
        assert_eq!(canonical_language("golang"), "go");
        assert_eq!(canonical_language("php"), "php");
    }
}
