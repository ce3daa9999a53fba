/*!
Wire protocol: format detection plus the XML / JSON envelope codecs.

A `Codec` is picked once per exchange (by sniffing the first bytes on the
framed stream, or by URL path over HTTP) and then drives every step of
that exchange:

  decode(bytes)          -> DecodedMapping
  is_complete(buffer)    -> keep reading?
  format(auto, resp, ex) -> response envelope bytes
  escape_breaking_chars  -> exception text safe for the envelope

Client helpers (`encode_request`, `decode_response`) live here too so both
ends of the wire share one definition of the envelope.
*/

pub mod json;
pub mod mapping;
pub mod xml;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::ProtocolError;

pub use mapping::{DecodedMapping, FlagValue};

/// Parsed response envelope (client side).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Handler output; `""` when the exchange failed.
    pub response: Value,
    /// Failure text; empty on success.
    pub exception: String,
    /// Always `1` on a complete envelope.
    pub finished: u8,
}

impl ResponseEnvelope {
    pub fn is_error(&self) -> bool {
        !self.exception.is_empty()
    }
}

/// Envelope flavour used for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Xml,
    Json,
}

impl Codec {
    /// Classify a (possibly partial) buffer.
    ///
    /// `Ok(None)` means the buffer is still too short to tell: it is empty or
    /// a proper prefix of `<nap>` once surrounding whitespace is trimmed.
    pub fn sniff(buf: &[u8]) -> Result<Option<Codec>, ProtocolError> {
        let trimmed = buf.trim_ascii();
        if trimmed.starts_with(xml::OPEN_TAG) {
            Ok(Some(Codec::Xml))
        } else if trimmed.starts_with(b"{") {
            Ok(Some(Codec::Json))
        } else if xml::OPEN_TAG.starts_with(trimmed) {
            Ok(None)
        } else {
            Err(ProtocolError::UnknownFormat)
        }
    }

    /// Classify a complete message.
    pub fn detect(buf: &[u8]) -> Result<Codec, ProtocolError> {
        Codec::sniff(buf)?.ok_or(ProtocolError::UnknownFormat)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedMapping, ProtocolError> {
        match self {
            Codec::Xml => xml::decode(bytes),
            Codec::Json => json::decode(bytes),
        }
    }

    pub fn is_complete(&self, buf: &[u8]) -> bool {
        match self {
            Codec::Xml => xml::is_complete(buf),
            Codec::Json => json::is_complete(buf),
        }
    }

    pub fn escape_breaking_chars(&self, text: &str) -> String {
        match self {
            Codec::Xml => xml::escape_breaking_chars(text),
            Codec::Json => json::escape_breaking_chars(text),
        }
    }

    /// Build the response envelope.
    ///
    /// A non-empty `exception` forces an empty response. With `autoformat`
    /// the response must be a mapping; anything else is reported through the
    /// fixed "cannot autoformat" diagnostic instead. Without it the response
    /// is inserted verbatim (strings as-is, other values as JSON text).
    pub fn format(&self, autoformat: bool, response: Option<&Value>, exception: &str) -> Vec<u8> {
        let rendered = match response {
            Some(value) if exception.is_empty() => self.render_response(autoformat, value),
            _ => Ok(String::new()),
        };
        match rendered {
            Ok(body) => self.envelope(&body, exception),
            Err(err) => self.envelope("", &err.to_string()),
        }
    }

    fn render_response(&self, autoformat: bool, value: &Value) -> Result<String, ProtocolError> {
        if !autoformat {
            return Ok(match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        }
        let Value::Object(map) = value else {
            return Err(ProtocolError::NotAMapping);
        };
        match self {
            Codec::Xml => xml::render_mapping(map),
            Codec::Json => json::render_mapping(map),
        }
    }

    fn envelope(&self, body: &str, exception: &str) -> Vec<u8> {
        let exception = self.escape_breaking_chars(exception);
        match self {
            Codec::Xml => xml::envelope(body, &exception),
            Codec::Json => json::envelope(body, &exception),
        }
    }

    pub fn encode_request(&self, mapping: &DecodedMapping) -> Vec<u8> {
        match self {
            Codec::Xml => xml::encode_request(mapping),
            Codec::Json => json::encode_request(mapping),
        }
    }

    pub fn decode_response(&self, bytes: &[u8]) -> Result<ResponseEnvelope, ProtocolError> {
        match self {
            Codec::Xml => xml::decode_response(bytes),
            Codec::Json => json::decode_response(bytes),
        }
    }

    /// HTTP `Content-Type` for envelopes of this flavour.
    pub fn content_type(&self) -> &'static str {
        match self {
            Codec::Xml => "application/xml",
            Codec::Json => "application/json",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Codec::Xml => "xml",
            Codec::Json => "json",
        })
    }
}
