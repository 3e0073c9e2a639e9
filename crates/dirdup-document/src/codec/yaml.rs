//! YAML codec for Unity-style multi-document files
//!
//! Built on `saphyr-parser` events rather than a typed value model, so that:
//! - scalars keep their raw source text (`0000000000000000e000000000000000`
//!   stays a string, `1.0` stays `1.0`)
//! - mapping order and repeated keys survive
//!
//! The text is split into documents at separator lines before parsing. Each
//! separator's root tag is kept on the [`Document`]; anchors, `stripped`
//! markers and `%` directives are dropped, as a generic emitter would drop
//! them. Each mapping and sequence remembers whether it was written in block
//! or flow style, and the serializer writes it back the same way, followed
//! by `--- <tag>` separators and an explicit `...` end-of-stream marker.

use crate::codec::DocumentCodec;
use crate::error::{ParseError, SerializeError};
use crate::node::{CollectionStyle, Document, DocumentNode, DocumentSet, Scalar, ScalarStyle};
use saphyr_parser::{Event, Parser, ScalarStyle as SourceStyle, Span};
use std::fmt::Write as _;

/// Document separator prefix
const SEPARATOR: &str = "---";

/// Explicit end-of-stream marker
const END_OF_STREAM: &str = "...";

/// Indentation step for nested mappings
const INDENT: usize = 2;

/// YAML codec
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl YamlCodec {
    /// Create new YAML codec
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DocumentCodec for YamlCodec {
    fn parse(&self, text: &str) -> Result<DocumentSet, ParseError> {
        let documents = split_sections(text)
            .iter()
            .enumerate()
            .map(|(index, section)| parse_section(index, section))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::trace!(documents = documents.len(), "parsed yaml stream");
        Ok(DocumentSet::new(documents))
    }

    fn serialize(&self, documents: &DocumentSet) -> Result<String, SerializeError> {
        let mut out = String::new();
        for document in &documents.documents {
            match &document.tag {
                Some(tag) => writeln!(out, "{SEPARATOR} {tag}")?,
                None => writeln!(out, "{SEPARATOR}")?,
            }
            write_root(&mut out, &document.root)?;
        }
        writeln!(out, "{END_OF_STREAM}")?;
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "yaml"
    }
}

/// Raw lines of one document
#[derive(Debug)]
struct Section<'a> {
    tag: Option<String>,
    first_line: usize,
    lines: Vec<&'a str>,
}

fn split_sections(text: &str) -> Vec<Section<'_>> {
    let mut sections = Vec::new();
    let mut current: Option<Section<'_>> = None;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;

        if let Some(rest) = separator_rest(line) {
            sections.extend(current.take());
            let (tag, inline) = split_separator(rest);
            let mut section = Section {
                tag,
                first_line: line_no + 1,
                lines: Vec::new(),
            };
            if !inline.is_empty() {
                section.first_line = line_no;
                section.lines.push(inline);
            }
            current = Some(section);
            continue;
        }

        if line.trim_end() == END_OF_STREAM {
            sections.extend(current.take());
            continue;
        }

        match current.as_mut() {
            Some(section) => section.lines.push(line),
            None => {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('%') || trimmed.starts_with('#') {
                    continue;
                }
                // Bare document without a leading separator
                current = Some(Section {
                    tag: None,
                    first_line: line_no,
                    lines: vec![line],
                });
            }
        }
    }

    sections.extend(current);
    sections
}

fn separator_rest(line: &str) -> Option<&str> {
    if line.trim_end() == SEPARATOR {
        return Some("");
    }
    line.strip_prefix(SEPARATOR)
        .filter(|rest| rest.starts_with([' ', '\t']))
}

/// Split `!tag &anchor stripped <inline>` into the tag and any inline content
fn split_separator(rest: &str) -> (Option<String>, &str) {
    let mut tag = None;
    let mut remainder = rest.trim_start();
    loop {
        let end = remainder
            .find(char::is_whitespace)
            .unwrap_or(remainder.len());
        let token = &remainder[..end];
        if token.starts_with('!') && tag.is_none() {
            tag = Some(token.to_string());
        } else if !(token.starts_with('&') || token == "stripped") || token.is_empty() {
            break;
        }
        remainder = remainder[end..].trim_start();
    }
    (tag, remainder)
}

fn parse_section(index: usize, section: &Section<'_>) -> Result<Document, ParseError> {
    let blank = section.lines.iter().all(|line| {
        let trimmed = line.trim();
        trimmed.is_empty() || trimmed.starts_with('#')
    });
    if blank {
        return Ok(Document::new(
            section.tag.clone(),
            DocumentNode::Scalar(Scalar::default()),
        ));
    }

    let body = section.lines.join("\n");
    let source = SourceText::new(&body);
    let mut builder = TreeBuilder::new(index);
    for item in Parser::new_from_str(&body) {
        let (event, span) = item.map_err(|e| {
            ParseError::syntax_error(
                index,
                section.first_line + e.marker().line().saturating_sub(1),
                e.info(),
            )
        })?;
        let step = match event {
            Event::Scalar(value, style, ..) => Step::Scalar(Scalar::with_style(
                value.to_string(),
                convert_style(style),
            )),
            Event::SequenceStart(..) => Step::SequenceStart(source.collection_style(span, '[')),
            Event::SequenceEnd => Step::SequenceEnd,
            Event::MappingStart(..) => Step::MappingStart(source.collection_style(span, '{')),
            Event::MappingEnd => Step::MappingEnd,
            Event::Alias(..) => return Err(ParseError::unsupported(index, "alias")),
            // Stream and document boundaries carry nothing for the tree
            _ => continue,
        };
        builder.apply(step)?;
    }

    Ok(Document::new(section.tag.clone(), builder.finish()?))
}

/// Section body, indexable by the parser's character offsets
struct SourceText<'a> {
    text: &'a str,
    chars: Option<Vec<char>>,
}

impl<'a> SourceText<'a> {
    fn new(text: &'a str) -> Self {
        let chars = (!text.is_ascii()).then(|| text.chars().collect());
        Self { text, chars }
    }

    fn char_at(&self, index: usize) -> Option<char> {
        match &self.chars {
            Some(chars) => chars.get(index).copied(),
            None => self.text.as_bytes().get(index).map(|b| char::from(*b)),
        }
    }

    /// Flow collections start on their opening bracket, block ones on content
    fn collection_style(&self, span: Span, opening: char) -> CollectionStyle {
        if self.char_at(span.start.index()) == Some(opening) {
            CollectionStyle::Flow
        } else {
            CollectionStyle::Block
        }
    }
}

/// Tree-relevant parser event
#[derive(Debug)]
enum Step {
    Scalar(Scalar),
    SequenceStart(CollectionStyle),
    SequenceEnd,
    MappingStart(CollectionStyle),
    MappingEnd,
}

/// Container under construction
#[derive(Debug)]
enum Frame {
    Mapping {
        entries: Vec<(String, DocumentNode)>,
        pending_key: Option<String>,
        style: CollectionStyle,
    },
    Sequence {
        items: Vec<DocumentNode>,
        style: CollectionStyle,
    },
}

/// Builds a [`DocumentNode`] tree from parser events
#[derive(Debug)]
struct TreeBuilder {
    document: usize,
    stack: Vec<Frame>,
    root: Option<DocumentNode>,
}

impl TreeBuilder {
    fn new(document: usize) -> Self {
        Self {
            document,
            stack: Vec::new(),
            root: None,
        }
    }

    fn apply(&mut self, step: Step) -> Result<(), ParseError> {
        match step {
            Step::Scalar(scalar) => self.push_node(DocumentNode::Scalar(scalar)),
            Step::SequenceStart(style) => {
                self.stack.push(Frame::Sequence {
                    items: Vec::new(),
                    style,
                });
                Ok(())
            }
            Step::MappingStart(style) => {
                self.stack.push(Frame::Mapping {
                    entries: Vec::new(),
                    pending_key: None,
                    style,
                });
                Ok(())
            }
            Step::SequenceEnd => match self.stack.pop() {
                Some(Frame::Sequence { items, style }) => {
                    self.push_node(DocumentNode::Sequence { items, style })
                }
                _ => Err(ParseError::UnexpectedEnd(self.document)),
            },
            Step::MappingEnd => match self.stack.pop() {
                Some(Frame::Mapping {
                    entries,
                    pending_key: None,
                    style,
                }) => self.push_node(DocumentNode::Mapping { entries, style }),
                Some(Frame::Mapping {
                    pending_key: Some(key),
                    ..
                }) => Err(ParseError::unsupported(
                    self.document,
                    format!("key {key:?} without value"),
                )),
                _ => Err(ParseError::UnexpectedEnd(self.document)),
            },
        }
    }

    fn push_node(&mut self, node: DocumentNode) -> Result<(), ParseError> {
        match self.stack.last_mut() {
            None => {
                if self.root.is_some() {
                    return Err(ParseError::unsupported(
                        self.document,
                        "more than one root node",
                    ));
                }
                self.root = Some(node);
            }
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping {
                entries,
                pending_key,
                ..
            }) => match pending_key.take() {
                Some(key) => entries.push((key, node)),
                None => match node {
                    DocumentNode::Scalar(scalar) => *pending_key = Some(scalar.value),
                    DocumentNode::Mapping { .. } | DocumentNode::Sequence { .. } => {
                        return Err(ParseError::unsupported(self.document, "complex mapping key"));
                    }
                },
            },
        }
        Ok(())
    }

    fn finish(self) -> Result<DocumentNode, ParseError> {
        if !self.stack.is_empty() {
            return Err(ParseError::UnexpectedEnd(self.document));
        }
        Ok(self
            .root
            .unwrap_or_else(|| DocumentNode::Scalar(Scalar::default())))
    }
}

fn convert_style(style: SourceStyle) -> ScalarStyle {
    match style {
        SourceStyle::Plain => ScalarStyle::Plain,
        SourceStyle::SingleQuoted => ScalarStyle::SingleQuoted,
        SourceStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
        _ => ScalarStyle::Block,
    }
}

// Emitter

/// True for collections written inline: flow style, or empty
fn is_inline(node: &DocumentNode) -> bool {
    match node {
        DocumentNode::Mapping { entries, style } => {
            *style == CollectionStyle::Flow || entries.is_empty()
        }
        DocumentNode::Sequence { items, style } => {
            *style == CollectionStyle::Flow || items.is_empty()
        }
        DocumentNode::Scalar(_) => false,
    }
}

fn write_root(out: &mut String, root: &DocumentNode) -> Result<(), SerializeError> {
    match root {
        node if is_inline(node) => {
            write_flow(out, node)?;
            out.push('\n');
        }
        DocumentNode::Mapping { entries, .. } => write_entries(out, entries, 0)?,
        DocumentNode::Sequence { items, .. } => write_items(out, items, 0)?,
        DocumentNode::Scalar(scalar) => {
            if !scalar.value.is_empty() || scalar.style != ScalarStyle::Plain {
                write_scalar(out, scalar)?;
                out.push('\n');
            }
        }
    }
    Ok(())
}

fn write_entries(
    out: &mut String,
    entries: &[(String, DocumentNode)],
    indent: usize,
) -> Result<(), SerializeError> {
    for (key, value) in entries {
        write_indent(out, indent);
        write_entry(out, key, value, indent)?;
    }
    Ok(())
}

/// Write `key: value` starting at the current cursor; `indent` is the key column
fn write_entry(
    out: &mut String,
    key: &str,
    value: &DocumentNode,
    indent: usize,
) -> Result<(), SerializeError> {
    write_key(out, key)?;
    out.push(':');
    match value {
        node if is_inline(node) => {
            out.push(' ');
            write_flow(out, node)?;
            out.push('\n');
        }
        DocumentNode::Scalar(scalar) => {
            out.push(' ');
            write_scalar(out, scalar)?;
            out.push('\n');
        }
        DocumentNode::Mapping { entries, .. } => {
            out.push('\n');
            write_entries(out, entries, indent + INDENT)?;
        }
        DocumentNode::Sequence { items, .. } => {
            // Sequence dashes sit at the key column
            out.push('\n');
            write_items(out, items, indent)?;
        }
    }
    Ok(())
}

fn write_items(out: &mut String, items: &[DocumentNode], indent: usize) -> Result<(), SerializeError> {
    for item in items {
        write_indent(out, indent);
        out.push('-');
        write_item(out, item, indent)?;
    }
    Ok(())
}

/// Write a sequence item right after its dash; `indent` is the dash column
fn write_item(out: &mut String, item: &DocumentNode, indent: usize) -> Result<(), SerializeError> {
    let inner = indent + INDENT;
    match item {
        node if is_inline(node) => {
            out.push(' ');
            write_flow(out, node)?;
            out.push('\n');
        }
        DocumentNode::Scalar(scalar) => {
            out.push(' ');
            write_scalar(out, scalar)?;
            out.push('\n');
        }
        DocumentNode::Mapping { entries, .. } => {
            out.push(' ');
            for (position, (key, value)) in entries.iter().enumerate() {
                if position > 0 {
                    write_indent(out, inner);
                }
                write_entry(out, key, value, inner)?;
            }
        }
        DocumentNode::Sequence { items, .. } => {
            out.push(' ');
            for (position, child) in items.iter().enumerate() {
                if position > 0 {
                    write_indent(out, inner);
                }
                out.push('-');
                write_item(out, child, inner)?;
            }
        }
    }
    Ok(())
}

/// Write `node` on the current line as `{k: v, ..}`, `[a, ..]` or a scalar
///
/// Everything below a flow collection is flow too.
fn write_flow(out: &mut String, node: &DocumentNode) -> Result<(), SerializeError> {
    match node {
        DocumentNode::Mapping { entries, .. } => {
            out.push('{');
            for (position, (key, value)) in entries.iter().enumerate() {
                if position > 0 {
                    out.push_str(", ");
                }
                if !key.is_empty() && is_flow_plain_safe(key) {
                    out.push_str(key);
                } else {
                    write_double_quoted(out, key)?;
                }
                out.push_str(": ");
                write_flow(out, value)?;
            }
            out.push('}');
        }
        DocumentNode::Sequence { items, .. } => {
            out.push('[');
            for (position, item) in items.iter().enumerate() {
                if position > 0 {
                    out.push_str(", ");
                }
                write_flow(out, item)?;
            }
            out.push(']');
        }
        DocumentNode::Scalar(scalar) => match scalar.style {
            ScalarStyle::Plain if !is_flow_plain_safe(&scalar.value) => {
                write_double_quoted(out, &scalar.value)?;
            }
            _ => write_scalar(out, scalar)?,
        },
    }
    Ok(())
}

fn write_indent(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat(' ').take(indent));
}

fn write_key(out: &mut String, key: &str) -> Result<(), SerializeError> {
    if !key.is_empty() && is_plain_safe(key) {
        out.push_str(key);
        Ok(())
    } else {
        write_double_quoted(out, key)
    }
}

fn write_scalar(out: &mut String, scalar: &Scalar) -> Result<(), SerializeError> {
    let value = scalar.value.as_str();
    match scalar.style {
        ScalarStyle::Plain if is_plain_safe(value) => out.push_str(value),
        ScalarStyle::SingleQuoted if !value.contains('\n') => {
            out.push('\'');
            out.push_str(&value.replace('\'', "''"));
            out.push('\'');
        }
        _ => write_double_quoted(out, value)?,
    }
    Ok(())
}

fn write_double_quoted(out: &mut String, value: &str) -> Result<(), SerializeError> {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => write!(out, "\\u{:04X}", u32::from(c))?,
            c => out.push(c),
        }
    }
    out.push('"');
    Ok(())
}

/// True when `value` can be written unquoted inside a flow collection
fn is_flow_plain_safe(value: &str) -> bool {
    is_plain_safe(value) && !value.contains([',', '[', ']', '{', '}', ':'])
}

/// True when `value` can be written unquoted in block context and read back unchanged
fn is_plain_safe(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return true;
    };
    if value.starts_with(char::is_whitespace) || value.ends_with(char::is_whitespace) {
        return false;
    }
    if value.contains('\n') || value.contains(": ") || value.contains(" #") || value.ends_with(':') {
        return false;
    }
    if matches!(
        first,
        '[' | ']' | '{' | '}' | ',' | '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%' | '@' | '`'
    ) {
        return false;
    }
    if matches!(first, '-' | '?' | ':') {
        return value[1..].chars().next().is_some_and(|c| !c.is_whitespace());
    }
    true
}
