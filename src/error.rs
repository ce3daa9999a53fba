//! Protocol-level errors raised while framing, decoding or formatting envelopes.
//!
//! The `Display` text of a decode error is what a client sees in the
//! `exception` field, so messages are written for the remote caller.

use thiserror::Error;

/// Fixed diagnostic for an autoformat request whose handler did not return a mapping.
pub const NOT_A_MAPPING: &str = "cannot autoformat non-mapping value; check the handler's return value.";

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Leading bytes match neither `<nap>` nor `{`. No envelope can be produced.
    #[error("received unknown message format")]
    UnknownFormat,

    /// Peer closed the connection before the codec judged the message complete.
    #[error("connection closed before the message was complete ({received} bytes received)")]
    Incomplete { received: usize },

    #[error("message is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("root must be named `nap`, message must be in `<nap>...</nap>` (found `<{0}>`)")]
    WrongRoot(String),

    #[error("XML document has no root element")]
    EmptyDocument,

    #[error("XML document has more than one root element")]
    MultipleRoots,

    #[error("XML element `<{0}>` is never closed")]
    Unclosed(String),

    #[error("JSON message must be an object")]
    NotAnObject,

    #[error("unsupported value for key `{0}` (expected a string, number, boolean, null or a list of those)")]
    UnsupportedValue(String),

    #[error("{}", NOT_A_MAPPING)]
    NotAMapping,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Framing failures end the exchange without any envelope.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            ProtocolError::UnknownFormat | ProtocolError::Incomplete { .. } | ProtocolError::Io(_)
        )
    }
}
