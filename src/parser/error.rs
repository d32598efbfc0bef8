//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur during HTTP request parsing.
///
/// Every variant is a protocol error: the server answers it with the status
/// returned by [`Error::status_code`] and then closes the connection.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP method in the request is not supported.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// The request line is malformed (wrong format or missing components).
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// The request declares a protocol version other than HTTP/1.1.
    #[error("Unsupported HTTP version: {0}")]
    UnsupportedVersion(String),

    /// A header in the request has an invalid format.
    #[error("Invalid header format: {0}")]
    InvalidHeaderFormat(String),

    /// The `content-length` header is not an unsigned integer.
    #[error("Invalid content length: {0}")]
    InvalidContentLength(String),

    /// Fewer body bytes are available than `content-length` declares.
    #[error("Body length mismatch: declared {declared}, available {available}")]
    BodyLengthMismatch { declared: usize, available: usize },

    /// A POST request arrived without a body.
    #[error("Empty request body")]
    EmptyBody,

    /// The request is empty.
    #[error("Empty request")]
    EmptyRequest,

    /// The request does not fit into a connection buffer.
    #[error("Request exceeds {0} bytes")]
    RequestTooLarge(usize),

    /// The body was sent with a content type the caller cannot decode.
    #[error("Unexpected content type: {0}")]
    UnexpectedContentType(String),

    /// Error parsing JSON.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl Error {
    /// The status code a server should answer this error with.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::UnsupportedVersion(_) => 505,
            _ => 400,
        }
    }
}
