//! Wire format of the drawing relay.
//!
//! Every frame in either direction is a JSON object with two fields:
//!
//! ```text
//! {"method":"draw","data":{...}}
//! ```
//!
//! `data` is opaque to the server. It is kept as raw JSON text so that the
//! payload a peer receives is byte-equal to the payload its origin sent.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;

/// Errors raised while decoding or encoding a frame.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid payload: {0}")]
    Payload(#[source] serde_json::Error),
}

/// Message method tag.
///
/// Tags outside the known set survive decoding as [`Method::Unknown`] so the
/// receiver can log them before dropping the frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Method {
    Draw,
    Clear,
    HistoryRequest,
    HistoryResponse,
    Unknown(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Draw => "draw",
            Method::Clear => "clear",
            Method::HistoryRequest => "history-request",
            Method::HistoryResponse => "history-response",
            Method::Unknown(tag) => tag,
        }
    }
}

impl From<String> for Method {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "draw" => Method::Draw,
            "clear" => Method::Clear,
            "history-request" => Method::HistoryRequest,
            "history-response" => Method::HistoryResponse,
            _ => Method::Unknown(tag),
        }
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        match method {
            Method::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single relay message.
///
/// A missing `data` field and an explicit `null` both decode to `None`, which
/// encodes back as `"data":null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub method: Method,
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}

impl Message {
    pub fn new(method: Method, data: Option<Box<RawValue>>) -> Self {
        Self { method, data }
    }

    /// Build a message whose payload is the given JSON text.
    ///
    /// The text must be valid JSON; it is stored exactly as given.
    pub fn with_raw_data(method: Method, json: &str) -> Result<Self, CodecError> {
        let data = RawValue::from_string(json.to_string()).map_err(CodecError::Payload)?;
        Ok(Self::new(method, Some(data)))
    }

    /// Build a message whose payload is serialized from `value`.
    pub fn with_data<T: Serialize>(method: Method, value: &T) -> Result<Self, CodecError> {
        let data = serde_json::value::to_raw_value(value).map_err(CodecError::Payload)?;
        Ok(Self::new(method, Some(data)))
    }

    pub fn history_request() -> Self {
        Self::new(Method::HistoryRequest, None)
    }

    /// Raw JSON text of the payload, if any.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref().map(RawValue::get)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::Decode)
    }

    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::Encode)
    }
}
