//! JSON envelope: a flat object of flag keys to string / number / list values.
//!
//! Responses are `{"response": .., "exception": "..", "finished": 1}` with
//! `", "` / `": "` separators, the same layout clients already match on.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};

use super::ResponseEnvelope;
use super::mapping::{DecodedMapping, FlagValue};
use crate::error::ProtocolError;

/* ---- Spaced Serialization ---- */

/// Compact JSON with a space after every `,` and `:`.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

pub fn to_spaced_string(value: &Value) -> Result<String, ProtocolError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| ProtocolError::Utf8(e.utf8_error()))
}

/* ---- Codec Operations ---- */

/// Scalar wire value as argument text; booleans and null are bare flags.
fn scalar_text(key: &str, value: &Value) -> Result<String, ProtocolError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(_) | Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(ProtocolError::UnsupportedValue(key.to_string())),
    }
}

pub fn decode(bytes: &[u8]) -> Result<DecodedMapping, ProtocolError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let Value::Object(object) = value else {
        return Err(ProtocolError::NotAnObject);
    };

    let mut mapping = DecodedMapping::new();
    for (key, value) in &object {
        match value {
            Value::Array(items) => {
                let list = items
                    .iter()
                    .map(|item| scalar_text(key, item))
                    .collect::<Result<Vec<_>, _>>()?;
                mapping.insert(key.as_str(), FlagValue::List(list));
            }
            other => mapping.insert(key.as_str(), scalar_text(key, other)?),
        }
    }
    Ok(mapping)
}

pub fn is_complete(buf: &[u8]) -> bool {
    let open = buf.iter().filter(|&&b| b == b'{').count();
    let close = buf.iter().filter(|&&b| b == b'}').count();
    open == close
}

pub fn escape_breaking_chars(text: &str) -> String {
    text.replace('"', "'")
}

pub fn render_mapping(map: &Map<String, Value>) -> Result<String, ProtocolError> {
    to_spaced_string(&Value::Object(map.clone()))
}

/// Wrap an already-rendered response body and an already-escaped exception.
///
/// An empty body is sent as `""`; anything else is inserted verbatim.
pub fn envelope(response: &str, exception: &str) -> Vec<u8> {
    let response = if response.is_empty() { "\"\"" } else { response };
    // Backslashes and control characters still need JSON escaping.
    let exception = Value::String(exception.to_string());
    format!("{{\"response\": {response}, \"exception\": {exception}, \"finished\": 1}}").into_bytes()
}

pub fn encode_request(mapping: &DecodedMapping) -> Vec<u8> {
    let mut object = Map::new();
    for (key, value) in mapping.iter() {
        let v = match value {
            FlagValue::Single(s) => Value::String(s.clone()),
            FlagValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        };
        object.insert(key.to_string(), v);
    }
    // Serializing a string-only object cannot fail.
    to_spaced_string(&Value::Object(object))
        .unwrap_or_else(|_| "{}".to_string())
        .into_bytes()
}

pub fn decode_response(bytes: &[u8]) -> Result<ResponseEnvelope, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn spaced_output() {
        let v = json!({"x": [11, 22, 33], "z": [[1, 2], [3]], "s": "a\"b"});
        assert_eq!(
            to_spaced_string(&v).unwrap(),
            r#"{"x": [11, 22, 33], "z": [[1, 2], [3]], "s": "a\"b"}"#
        );
    }

    #[test]
    fn decode_scalars_and_lists() {
        let m = decode(br#"{"-x": ["1 2 3", "11 22 33"], "-y": [1, 11], "--var_int": 4, "--var_true": ""}"#)
            .unwrap();
        assert_eq!(
            m.get("-x"),
            Some(&FlagValue::List(vec!["1 2 3".into(), "11 22 33".into()]))
        );
        assert_eq!(
            m.get("-y"),
            Some(&FlagValue::List(vec!["1".into(), "11".into()]))
        );
        assert_eq!(m.get("--var_int"), Some(&FlagValue::Single("4".into())));
        assert_eq!(m.get("--var_true"), Some(&FlagValue::Single(String::new())));
    }

    #[test]
    fn decode_booleans_and_null() {
        let m = decode(br#"{"--on": true, "--off": false, "--nil": null}"#).unwrap();
        assert_eq!(m.get("--on"), Some(&FlagValue::Single(String::new())));
        assert_eq!(m.get("--off"), Some(&FlagValue::Single(String::new())));
        assert_eq!(m.get("--nil"), Some(&FlagValue::Single(String::new())));
    }

    #[test]
    fn false_is_a_bare_flag_in_the_argument_string() {
        let m = decode(br#"{"--var_true": false, "-y": 0}"#).unwrap();
        assert_eq!(crate::argv::to_arg_string(&m), "--var_true -y 0");
    }

    #[test]
    fn decode_duplicate_key_keeps_last() {
        let m = decode(br#"{"-x": "1 2 3", "-x": "11 22 33"}"#).unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("-x"), Some(&FlagValue::Single("11 22 33".into())));
    }

    #[test]
    fn decode_rejects_non_objects_and_nesting() {
        assert!(matches!(decode(b"[1, 2]"), Err(ProtocolError::NotAnObject)));
        assert!(matches!(
            decode(br#"{"-x": {"a": 1}}"#),
            Err(ProtocolError::UnsupportedValue(ref k)) if k == "-x"
        ));
        assert!(matches!(decode(br#"{"-x": "#), Err(ProtocolError::Json(_))));
    }

    #[test]
    fn brace_count_is_literal() {
        assert!(!is_complete(br#"{"-x": "1""#));
        assert!(is_complete(br#"{"-x": "1"}"#));
        // A brace inside a string literal shifts the cut-over point.
        assert!(!is_complete(br#"{"-x": "{"}"#));
        assert!(is_complete(br#"{"-x": "}"#));
    }

    #[test]
    fn envelope_layouts() {
        assert_eq!(
            envelope("", "division by zero"),
            br#"{"response": "", "exception": "division by zero", "finished": 1}"#.to_vec()
        );
        assert_eq!(
            envelope(r#"{"a": 1}"#, ""),
            br#"{"response": {"a": 1}, "exception": "", "finished": 1}"#.to_vec()
        );
    }

    #[test]
    fn exception_escaping_keeps_envelope_valid() {
        let escaped = escape_breaking_chars("bad \"value\"\nnext\\line");
        assert_eq!(escaped, "bad 'value'\nnext\\line");
        let env = decode_response(&envelope("", &escaped)).unwrap();
        assert_eq!(env.exception, escaped);
        assert_eq!(env.finished, 1);
    }

    #[test]
    fn request_roundtrip() {
        let mut m = DecodedMapping::new();
        m.push("--var_str", "value");
        m.push("-x", "1 2 3");
        m.push("-x", "11 22 33");
        let wire = encode_request(&m);
        assert_eq!(
            wire,
            br#"{"--var_str": "value", "-x": ["1 2 3", "11 22 33"]}"#.to_vec()
        );
        assert_eq!(decode(&wire).unwrap(), m);
    }
}
