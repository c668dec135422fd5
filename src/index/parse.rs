/// Structural segmentation of a loaded document.
///
/// The document is cut into source blocks, each block into header chunks,
/// and every header chunk becomes a [`Segment`] tagged with the section,
/// class and method it belongs to. Segments are later smart-chunked.
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::loader::DocumentKind;
use super::records::Parameter;
use crate::chunker::scan::{is_fence, parse_header};
use crate::chunker::{SourceKind, chunk_by_headers, chunk_by_source_blocks};

/// Product name substituted for `<ProductName/>` in guide headers.
const PRODUCT_NAME: &str = "OpenFGA";

/// Source file extensions whose stem names a class.
const CLASS_FILE_EXTENSIONS: &[&str] = &["php", "go", "py", "java", "cs", "js", "ts"];

const CLASS_LEVEL: u8 = 3;
const CLASS_SUBSECTION_LEVEL: u8 = 4;
const METHOD_LEVEL: u8 = 5;

static PRODUCT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<ProductName[^>]*/>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?[A-Za-z][^>]*>").unwrap());
static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\{[^}]*\}\s*").unwrap());
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static NAMESPACE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*\**Namespace\**\s*:\s*\**\s*`?([\w\\.]+)`?").unwrap()
});
static NAMESPACE_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:namespace|package)\s+([\w\\.]+)\s*;?\s*$").unwrap()
});
static PARAMETERS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:#{1,6}\s*)?\**parameters\**\s*:?\s*$").unwrap());
static BULLET_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[-*+]\s+`?(\$?[\w.]+)`?\s*(?:\(([^)]*)\))?\s*(?:[:\-]\s*(.*))?$").unwrap()
});
static RETURNS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:#{1,6}\s*)?\**returns?\b\**\s*:?\s*\**\s*(.*?)\s*$").unwrap()
});

/// A header chunk placed in the document structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Segment {
    pub content: String,
    pub section: Option<String>,
    pub class: Option<String>,
    pub method: Option<String>,
    pub source_file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ParsedMethod {
    pub name: String,
    pub header: String,
    pub content: String,
    /// Indices into [`ParsedDocument::segments`].
    pub segments: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ParsedClass {
    pub name: String,
    pub source_file: Option<String>,
    pub content: String,
    pub methods: Vec<ParsedMethod>,
    pub segments: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ParsedDocument {
    pub sections: Vec<String>,
    pub classes: Vec<ParsedClass>,
    pub segments: Vec<Segment>,
}

impl ParsedDocument {
    fn enter_section(&mut self, kind: DocumentKind, raw: &str) -> String {
        let name = match kind {
            DocumentKind::Sdk => raw.trim().to_string(),
            DocumentKind::Guide => clean_section_name(raw, self.sections.len() + 1),
        };
        if !self.sections.contains(&name) {
            self.sections.push(name.clone());
        }
        name
    }

    fn push_segment(&mut self, segment: Segment) -> usize {
        self.segments.push(segment);
        self.segments.len() - 1
    }

    /// Store `class`, merging it into an earlier class of the same name.
    fn close_class(&mut self, class: ParsedClass) {
        if class.segments.is_empty() {
            return;
        }
        match self.classes.iter_mut().find(|c| c.name == class.name) {
            Some(existing) => {
                append_paragraph(&mut existing.content, &class.content);
                existing.segments.extend(class.segments);
                existing.methods.extend(class.methods);
                if existing.source_file.is_none() {
                    existing.source_file = class.source_file;
                }
            }
            None => self.classes.push(class),
        }
    }
}

fn is_section_level(kind: DocumentKind, level: u8) -> bool {
    match kind {
        DocumentKind::Sdk => level == 2,
        DocumentKind::Guide => level == 2 || level == 3,
    }
}

/// Segment `content` according to the conventions of `kind`.
pub(crate) fn parse_document(content: &str, kind: DocumentKind) -> ParsedDocument {
    let mut doc = ParsedDocument::default();
    let mut section: Option<String> = None;

    for block in chunk_by_source_blocks(content) {
        if block.kind == SourceKind::SourceBlock && kind == DocumentKind::Sdk {
            parse_source_block(&mut doc, &mut section, &block.content, block.source);
            continue;
        }
        for chunk in chunk_by_headers(&block.content) {
            if let Some(heading) = &chunk.heading {
                if is_section_level(kind, heading.level) {
                    section = Some(doc.enter_section(kind, &heading.text));
                }
            }
            doc.push_segment(Segment {
                content: chunk.content,
                section: section.clone(),
                source_file: block.source.clone(),
                ..Segment::default()
            });
        }
    }

    doc
}

fn parse_source_block(
    doc: &mut ParsedDocument,
    section: &mut Option<String>,
    content: &str,
    source_file: Option<String>,
) {
    let mut class = source_file
        .as_deref()
        .and_then(class_name_from_path)
        .map(|name| ParsedClass {
            name,
            source_file: source_file.clone(),
            ..ParsedClass::default()
        });
    let mut method: Option<ParsedMethod> = None;

    for chunk in chunk_by_headers(content) {
        match chunk.heading.as_ref().map(|h| (h.level, h.text.as_str())) {
            Some((level, text)) if is_section_level(DocumentKind::Sdk, level) => {
                *section = Some(doc.enter_section(DocumentKind::Sdk, text));
            }
            Some((CLASS_LEVEL, text)) => {
                close_method(&mut class, method.take());
                if let Some(done) = class.take() {
                    doc.close_class(done);
                }
                class = Some(ParsedClass {
                    name: clean_symbol(text),
                    source_file: source_file.clone(),
                    ..ParsedClass::default()
                });
            }
            Some((CLASS_SUBSECTION_LEVEL, _)) => close_method(&mut class, method.take()),
            Some((METHOD_LEVEL, text)) if class.is_some() => {
                close_method(&mut class, method.take());
                method = Some(ParsedMethod {
                    name: clean_symbol(text),
                    header: text.to_string(),
                    ..ParsedMethod::default()
                });
            }
            _ => {}
        }

        let idx = doc.push_segment(Segment {
            content: chunk.content.clone(),
            section: section.clone(),
            class: class.as_ref().map(|c| c.name.clone()),
            method: method.as_ref().map(|m| m.name.clone()),
            source_file: source_file.clone(),
        });
        if let Some(class) = class.as_mut() {
            append_paragraph(&mut class.content, &chunk.content);
            class.segments.push(idx);
        }
        if let Some(method) = method.as_mut() {
            append_paragraph(&mut method.content, &chunk.content);
            method.segments.push(idx);
        }
    }

    close_method(&mut class, method);
    if let Some(done) = class {
        doc.close_class(done);
    }
}

fn close_method(class: &mut Option<ParsedClass>, method: Option<ParsedMethod>) {
    if let (Some(class), Some(method)) = (class.as_mut(), method) {
        class.methods.push(method);
    }
}

fn append_paragraph(target: &mut String, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push_str("\n\n");
    }
    target.push_str(text);
}

/// `Client` from `src/Client.php`; `None` for files that are not code.
pub(crate) fn class_name_from_path(path: &str) -> Option<String> {
    let path = Path::new(path);
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    if !CLASS_FILE_EXTENSIONS.contains(&extension.as_str()) {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}

/// Symbol name from a header: markup and any parameter list removed.
pub(crate) fn clean_symbol(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !matches!(c, '`' | '*')).collect();
    let name = match stripped.find('(') {
        Some(idx) => &stripped[..idx],
        None => stripped.as_str(),
    };
    name.trim().to_string()
}

/// Guide section names with JSX and HTML markup removed.
pub(crate) fn clean_section_name(raw: &str, ordinal: usize) -> String {
    let name = PRODUCT_NAME_RE.replace_all(raw, PRODUCT_NAME);
    let name = TAG_RE.replace_all(&name, "");
    let name = ATTRIBUTE_RE.replace_all(&name, " ");
    let name = name.replace(['<', '>'], "");
    let name = SPACES_RE.replace_all(&name, " ").trim().to_string();
    if !name.is_empty() {
        return name;
    }

    let fallback = raw.replace(['<', '>', '{', '}', '/'], "").trim().to_string();
    if !fallback.is_empty() {
        return fallback;
    }
    format!("Section {ordinal}")
}

/// `namespace` of a class, from a `Namespace:` label or a declaration.
pub(crate) fn extract_namespace(content: &str) -> Option<String> {
    NAMESPACE_LABEL_RE
        .captures(content)
        .or_else(|| NAMESPACE_DECL_RE.captures(content))
        .map(|caps| caps[1].to_string())
}

/// First line of the method's first code block, or the header when it
/// already reads like a signature.
pub(crate) fn extract_signature(header: &str, content: &str) -> Option<String> {
    let mut lines = content.lines();
    while let Some(line) = lines.next() {
        if is_fence(line) {
            return lines
                .by_ref()
                .take_while(|l| !is_fence(l))
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string);
        }
    }
    if header.contains('(') {
        let signature: String = header.chars().filter(|c| *c != '`').collect();
        return Some(signature.trim().to_string());
    }
    None
}

/// Parameters listed under a `Parameters` heading, as a table or bullets.
pub(crate) fn extract_parameters(content: &str) -> Vec<Parameter> {
    let mut parameters = Vec::new();
    let mut lines = content.lines().skip_while(|l| !PARAMETERS_RE.is_match(l));
    if lines.next().is_none() {
        return parameters;
    }

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if parameters.is_empty() {
                continue;
            }
            break;
        }
        if trimmed.starts_with('|') {
            if let Some(parameter) = table_parameter(trimmed) {
                parameters.push(parameter);
            }
            continue;
        }
        match BULLET_PARAM_RE.captures(trimmed) {
            Some(caps) => parameters.push(Parameter {
                name: caps[1].to_string(),
                type_name: non_blank(caps.get(2).map(|m| m.as_str())),
                description: non_blank(caps.get(3).map(|m| m.as_str())),
            }),
            None => break,
        }
    }
    parameters
}

fn table_parameter(row: &str) -> Option<Parameter> {
    let cells: Vec<&str> = row.trim_matches('|').split('|').map(str::trim).collect();
    let first = *cells.first()?;
    if first.is_empty() || first.starts_with('-') || first.starts_with(":-") {
        return None;
    }
    if matches!(
        first.to_ascii_lowercase().as_str(),
        "name" | "parameter" | "param"
    ) {
        return None;
    }
    Some(Parameter {
        name: first.trim_matches('`').to_string(),
        type_name: non_blank(cells.get(1).map(|c| c.trim_matches('`'))),
        description: non_blank(cells.get(2).copied()),
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Text of a `Returns` line, or the line after a bare `Returns` heading.
pub(crate) fn extract_returns(content: &str) -> Option<String> {
    let mut lines = content.lines();
    while let Some(line) = lines.next() {
        if parse_header(line).is_some_and(|(_, text)| !RETURNS_RE.is_match(text)) {
            continue;
        }
        let Some(caps) = RETURNS_RE.captures(line) else {
            continue;
        };
        if let Some(inline) = non_blank(Some(&caps[1])) {
            return Some(inline);
        }
        return lines
            .by_ref()
            .map(str::trim)
            .find(|l| !l.is_empty() && !is_fence(l))
            .map(str::to_string);
    }
    None
}
