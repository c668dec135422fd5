/// Resource addressing: `scheme://docs/{sdk}[/kind/...]`.
use std::fmt;
use std::sync::LazyLock;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use regex::Regex;

/// Scheme used when none is configured.
pub const DEFAULT_SCHEME: &str = "openfga";

static ABSOLUTE_URI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:\S+$").unwrap());

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*$").unwrap());

/// Bytes escaped inside one path segment; non-ASCII is always escaped.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// `None` when the escapes do not decode to UTF-8.
fn decode(segment: &str) -> Option<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

/// A documentation resource address, independent of its scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocUri {
    Overview { sdk: String },
    Section { sdk: String, section: String },
    Class { sdk: String, class: String },
    Method { sdk: String, class: String, method: String },
    Chunk { sdk: String, chunk_id: String },
    /// Keyword search across every document.
    Search { query: String },
}

impl DocUri {
    pub fn chunk(sdk: &str, chunk_id: &str) -> Self {
        Self::Chunk {
            sdk: sdk.to_string(),
            chunk_id: chunk_id.to_string(),
        }
    }

    /// Document the address points into; `None` for corpus-wide searches.
    pub fn sdk(&self) -> Option<&str> {
        match self {
            Self::Overview { sdk }
            | Self::Section { sdk, .. }
            | Self::Class { sdk, .. }
            | Self::Method { sdk, .. }
            | Self::Chunk { sdk, .. } => Some(sdk),
            Self::Search { .. } => None,
        }
    }

    /// Render under `scheme`.
    pub fn render(&self, scheme: &str) -> String {
        format!("{scheme}://docs/{}", self.path())
    }

    fn path(&self) -> String {
        match self {
            Self::Overview { sdk } => encode(sdk),
            Self::Section { sdk, section } => {
                format!("{}/section/{}", encode(sdk), encode(section))
            }
            Self::Class { sdk, class } => format!("{}/class/{}", encode(sdk), encode(class)),
            Self::Method { sdk, class, method } => format!(
                "{}/method/{}/{}",
                encode(sdk),
                encode(class),
                encode(method)
            ),
            Self::Chunk { sdk, chunk_id } => {
                format!("{}/chunk/{}", encode(sdk), encode(chunk_id))
            }
            Self::Search { query } => format!("search/{}", encode(query)),
        }
    }

    /// Parse `scheme://docs/...`, returning the scheme alongside the address.
    ///
    /// Segments are percent-decoded after splitting, so an escaped `/`
    /// stays inside its segment.
    pub fn parse(uri: &str) -> Option<(String, Self)> {
        let (scheme, rest) = uri.split_once("://")?;
        if !SCHEME_RE.is_match(scheme) {
            return None;
        }
        let rest = rest.strip_prefix("docs/")?.trim_end_matches('/');
        if let Some(query) = rest.strip_prefix("search/") {
            let query = decode(query)?;
            if query.trim().is_empty() {
                return None;
            }
            return Some((scheme.to_string(), Self::Search { query }));
        }

        let (sdk, tail) = match rest.split_once('/') {
            Some((sdk, tail)) => (sdk, Some(tail)),
            None => (rest, None),
        };
        let sdk = decode(sdk)?;
        if sdk.is_empty() {
            return None;
        }

        let parsed = match tail {
            None => Self::Overview { sdk },
            Some(tail) => {
                let (kind, value) = tail.split_once('/')?;
                if value.is_empty() {
                    return None;
                }
                match kind {
                    "section" => Self::Section {
                        sdk,
                        section: decode(value)?,
                    },
                    "class" => Self::Class {
                        sdk,
                        class: decode(value)?,
                    },
                    "method" => {
                        let (class, method) = value.split_once('/')?;
                        if class.is_empty() || method.is_empty() {
                            return None;
                        }
                        Self::Method {
                            sdk,
                            class: decode(class)?,
                            method: decode(method)?,
                        }
                    }
                    "chunk" => Self::Chunk {
                        sdk,
                        chunk_id: decode(value)?,
                    },
                    _ => return None,
                }
            }
        };
        Some((scheme.to_string(), parsed))
    }
}

impl fmt::Display for DocUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_SCHEME))
    }
}

/// Whether `uri` is an absolute URI (`scheme:rest`, no whitespace).
///
/// Covers both web URLs and internal `scheme://` references.
pub fn is_well_formed(uri: &str) -> bool {
    ABSOLUTE_URI_RE.is_match(uri)
}

/// Whether `scheme` is usable as a URI scheme.
pub fn is_valid_scheme(scheme: &str) -> bool {
    SCHEME_RE.is_match(scheme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        assert_eq!(
            DocUri::chunk("php", "php_chunk_000001").render("openfga"),
            "openfga://docs/php/chunk/php_chunk_000001"
        );
        let method = DocUri::Method {
            sdk: "go".into(),
            class: "Client".into(),
            method: "Check".into(),
        };
        assert_eq!(method.to_string(), "openfga://docs/go/method/Client/Check");
    }

    #[test]
    fn test_parse_round_trip() {
        let uris = [
            "openfga://docs/php",
            "openfga://docs/php/section/Getting%20Started",
            "openfga://docs/php/class/Client",
            "openfga://docs/php/method/Client/check",
            "openfga://docs/php/chunk/php_chunk_000003",
            "openfga://docs/search/check%20permission",
        ];
        for uri in uris {
            let (scheme, parsed) = DocUri::parse(uri).unwrap();
            assert_eq!(parsed.render(&scheme), uri);
        }
    }

    #[test]
    fn test_section_names_are_escaped() {
        let section = DocUri::Section {
            sdk: "php".into(),
            section: "Getting Started".into(),
        };
        let rendered = section.to_string();
        assert_eq!(rendered, "openfga://docs/php/section/Getting%20Started");
        assert!(is_well_formed(&rendered));
        assert_eq!(DocUri::parse(&rendered).unwrap().1, section);

        let odd = DocUri::Section {
            sdk: "authoring".into(),
            section: "What is <ProductName/>? 100% / ok".into(),
        };
        let rendered = odd.to_string();
        assert!(is_well_formed(&rendered));
        assert_eq!(DocUri::parse(&rendered).unwrap().1, odd);
    }

    #[test]
    fn test_unescaped_input_still_parses() {
        let (_, parsed) = DocUri::parse("openfga://docs/php/section/Getting Started").unwrap();
        assert_eq!(
            parsed,
            DocUri::Section {
                sdk: "php".into(),
                section: "Getting Started".into(),
            }
        );
        assert!(DocUri::parse("openfga://docs/php/class/%FF").is_none());
    }

    #[test]
    fn test_search_address() {
        let (_, parsed) = DocUri::parse("openfga://docs/search/write%20tuples").unwrap();
        assert_eq!(
            parsed,
            DocUri::Search {
                query: "write tuples".into(),
            }
        );
        assert_eq!(parsed.sdk(), None);
        assert!(DocUri::parse("openfga://docs/search/%20").is_none());
        assert!(matches!(
            DocUri::parse("openfga://docs/search"),
            Some((_, DocUri::Overview { .. }))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DocUri::parse("not a uri").is_none());
        assert!(DocUri::parse("openfga://other/php").is_none());
        assert!(DocUri::parse("openfga://docs/php/unknown/x").is_none());
        assert!(DocUri::parse("openfga://docs/php/method/Client").is_none());
    }

    #[test]
    fn test_well_formed() {
        assert!(is_well_formed("https://openfga.dev/docs"));
        assert!(is_well_formed("openfga://docs/php/chunk/php_chunk_000001"));
        assert!(!is_well_formed("no scheme here"));
        assert!(!is_well_formed(""));
    }
}
