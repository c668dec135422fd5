/// Compilation provenance embedded at the top of generated documents:
///
/// ```text
/// > Compiled from: https://github.com/openfga/php-sdk
/// > Generated: 2025-06-01 12:00:00
/// ```
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

static COMPILED_FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^>\s*Compiled from:\s*(.+?)\s*$").unwrap());

static GENERATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^>\s*Generated:\s*(.+?)\s*$").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    pub source: Option<String>,
    pub generated: Option<String>,
}

impl Provenance {
    /// First `Compiled from` and `Generated` lines of `content`.
    pub fn parse(content: &str) -> Self {
        let mut provenance = Self::default();
        for line in content.lines() {
            if provenance.source.is_none() {
                if let Some(caps) = COMPILED_FROM_RE.captures(line) {
                    provenance.source = Some(caps[1].to_string());
                    continue;
                }
            }
            if provenance.generated.is_none() {
                if let Some(caps) = GENERATED_RE.captures(line) {
                    provenance.generated = Some(caps[1].to_string());
                }
            }
            if provenance.source.is_some() && provenance.generated.is_some() {
                break;
            }
        }
        provenance
    }

    /// `generated` as a UTC timestamp, when it is in a recognized format.
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.generated.as_deref()?)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
