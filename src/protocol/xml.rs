//! XML envelope: `<nap><flag>value</flag>...</nap>`.
//!
//! Requests map each immediate child of `<nap>` to one key. Responses are
//! `<nap><response>..</response><exception>..</exception><finished>1</finished></nap>`.

use quick_xml::Reader;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

use super::json::to_spaced_string;
use super::mapping::{DecodedMapping, FlagValue};
use super::ResponseEnvelope;
use crate::error::ProtocolError;

pub const ROOT: &str = "nap";
pub const OPEN_TAG: &[u8] = b"<nap>";
pub const CLOSE_TAG: &[u8] = b"</nap>";

/* ---- Document Tree ---- */

/// Minimal element tree. `text` is the text before the first child element.
#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn named(start: &BytesStart<'_>) -> Self {
        Element {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            ..Default::default()
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.children.is_empty() {
            self.text.push_str(text);
        }
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ProtocolError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => return Err(ProtocolError::MultipleRoots),
        None => *root = Some(element),
    }
    Ok(())
}

fn parse_document(bytes: &[u8]) -> Result<Element, ProtocolError> {
    let text = std::str::from_utf8(bytes)?;
    let mut reader = Reader::from_str(text.trim());
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(ProtocolError::MultipleRoots);
                }
                stack.push(Element::named(&start));
            }
            Event::Empty(start) => attach(&mut stack, &mut root, Element::named(&start))?,
            Event::End(_) => {
                if let Some(done) = stack.pop() {
                    attach(&mut stack, &mut root, done)?;
                }
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.push_text(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(ProtocolError::Unclosed(open.name));
    }
    root.ok_or(ProtocolError::EmptyDocument)
}

fn parse_envelope(bytes: &[u8]) -> Result<Element, ProtocolError> {
    let root = parse_document(bytes)?;
    if root.name != ROOT {
        return Err(ProtocolError::WrongRoot(root.name));
    }
    Ok(root)
}

/// Repeated child tags aggregate into arrays; leaf elements become strings.
fn element_to_value(element: Element) -> Value {
    if element.children.is_empty() {
        return Value::String(element.text);
    }
    let mut map = Map::new();
    for child in element.children {
        let name = child.name.clone();
        let value = element_to_value(child);
        match map.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(name, value);
            }
        }
    }
    Value::Object(map)
}

/* ---- Codec Operations ---- */

pub fn decode(bytes: &[u8]) -> Result<DecodedMapping, ProtocolError> {
    let root = parse_envelope(bytes)?;
    let mut mapping = DecodedMapping::new();
    for child in root.children {
        mapping.push(child.name, child.text);
    }
    Ok(mapping)
}

pub fn is_complete(buf: &[u8]) -> bool {
    buf.trim_ascii().ends_with(CLOSE_TAG)
}

pub fn escape_breaking_chars(text: &str) -> String {
    text.replace('<', "[").replace('>', "]")
}

/// Text of a non-object value inside an autoformatted element.
fn leaf_text(value: &Value) -> Result<String, ProtocolError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => to_spaced_string(other),
    }
}

fn write_elements(out: &mut String, map: &Map<String, Value>) -> Result<(), ProtocolError> {
    for (key, value) in map {
        out.push('<');
        out.push_str(key);
        out.push('>');
        match value {
            Value::Object(inner) => write_elements(out, inner)?,
            other => out.push_str(&partial_escape(leaf_text(other)?.as_str())),
        }
        out.push_str("</");
        out.push_str(key);
        out.push('>');
    }
    Ok(())
}

/// Autoformat body: one element per key, recursing into nested mappings.
pub fn render_mapping(map: &Map<String, Value>) -> Result<String, ProtocolError> {
    let mut out = String::new();
    write_elements(&mut out, map)?;
    Ok(out)
}

/// Wrap an already-rendered response body and an already-escaped exception.
pub fn envelope(response: &str, exception: &str) -> Vec<u8> {
    format!(
        "<nap><response>{response}</response><exception>{exception}</exception><finished>1</finished></nap>"
    )
    .into_bytes()
}

/// Leading dashes become underscores; the tag grammar forbids a leading `-`.
fn tag_name(key: &str) -> String {
    let stripped = key.trim_start_matches('-');
    let dashes = key.len() - stripped.len();
    format!("{}{}", "_".repeat(dashes), stripped)
}

pub fn encode_request(mapping: &DecodedMapping) -> Vec<u8> {
    let mut out = String::from("<nap>");
    for (key, value) in mapping.iter() {
        let tag = tag_name(key);
        let values: Vec<&str> = match value {
            FlagValue::Single(s) => vec![s.as_str()],
            FlagValue::List(items) => items.iter().map(String::as_str).collect(),
        };
        for v in values {
            out.push_str(&format!("<{tag}>{}</{tag}>", partial_escape(v)));
        }
    }
    out.push_str("</nap>");
    out.into_bytes()
}

pub fn decode_response(bytes: &[u8]) -> Result<ResponseEnvelope, ProtocolError> {
    let root = parse_envelope(bytes)?;
    let mut envelope = ResponseEnvelope::default();
    for child in root.children {
        match child.name.as_str() {
            "response" => envelope.response = element_to_value(child),
            "exception" => envelope.exception = child.text,
            "finished" => envelope.finished = child.text.trim().parse().unwrap_or(0),
            _ => {}
        }
    }
    Ok(envelope)
}
