//! HTTP parser module.
//!
//! Turns raw bytes into validated HTTP/1.1 requests. [`frame`] finds where
//! one request ends inside a connection's accumulated bytes and
//! [`parse_request`] decodes exactly those bytes.

mod body;
mod error;
mod frame;
mod method;
mod request;
mod tests;
mod version;

// Re-export public items
pub use body::RequestBody;
pub use error::Error;
pub use frame::{frame, required_len, Frame};
pub use method::Method;
pub use request::HttpRequest;
pub use version::HttpVersion;

// Re-export the parse_request function
pub use request::parse_request;
