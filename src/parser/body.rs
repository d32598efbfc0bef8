//! Request body with on-demand decoders.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::parser::error::Error;

/// The body of an HTTP request.
///
/// Holds the raw bytes exactly as framed by `content-length`. Nothing is
/// decoded until one of the `as_*`/`json*` accessors is called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestBody {
    content_type: String,
    bytes: Vec<u8>,
}

impl RequestBody {
    /// Create a body from its content type and raw bytes.
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }

    /// The content type the body was sent with.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The raw body bytes.
    pub fn raw(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the body carries no text once decoded (empty or whitespace only).
    pub fn is_blank(&self) -> bool {
        self.as_text().trim().is_empty()
    }

    /// The body decoded as UTF-8, replacing invalid sequences.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Deserialize the body as JSON into `T`.
    ///
    /// Fails with [`Error::UnexpectedContentType`] unless the content type is
    /// `application/json`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        if !self.is_json() {
            return Err(Error::UnexpectedContentType(self.content_type.clone()));
        }
        Ok(serde_json::from_slice(&self.bytes)?)
    }

    /// Parse the body as an untyped JSON value, whatever the content type.
    pub fn json_value(&self) -> Result<serde_json::Value, Error> {
        Ok(serde_json::from_slice(&self.bytes)?)
    }

    /// Decode an `application/x-www-form-urlencoded` body.
    ///
    /// Pairs without `=` are skipped; on repeated keys the first value wins.
    pub fn as_form_values(&self) -> HashMap<String, String> {
        decode_pairs(&self.bytes)
    }

    /// Check if the body was sent as JSON.
    pub fn is_json(&self) -> bool {
        self.content_type.starts_with("application/json")
    }
}

/// Decode `k=v&k2=v2` pairs with form-urlencoding rules, first value wins.
pub(crate) fn decode_pairs(input: &[u8]) -> HashMap<String, String> {
    let mut pairs = HashMap::new();
    for segment in input.split(|b| *b == b'&') {
        if !segment.contains(&b'=') {
            continue;
        }
        if let Some((key, value)) = url::form_urlencoded::parse(segment).next() {
            pairs
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
    }
    pairs
}
