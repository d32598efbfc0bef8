//! HTTP response types and serialization.

use std::time::SystemTime;

use serde::Serialize;

use crate::server::error::Error;

/// HTTP status codes with their standard reason phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok = 200,
    Created = 201,
    Accepted = 202,
    NoContent = 204,
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    ServiceUnavailable = 503,
    HttpVersionNotSupported = 505,
}

impl StatusCode {
    /// Get the reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::Accepted => "Accepted",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::BadGateway => "Bad Gateway",
            StatusCode::ServiceUnavailable => "Service Unavailable",
            StatusCode::HttpVersionNotSupported => "HTTP Version Not Supported",
        }
    }

    /// The numeric code.
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Look up a status by its numeric code.
    pub fn from_u16(code: u16) -> Option<Self> {
        let status = match code {
            200 => StatusCode::Ok,
            201 => StatusCode::Created,
            202 => StatusCode::Accepted,
            204 => StatusCode::NoContent,
            400 => StatusCode::BadRequest,
            401 => StatusCode::Unauthorized,
            403 => StatusCode::Forbidden,
            404 => StatusCode::NotFound,
            405 => StatusCode::MethodNotAllowed,
            500 => StatusCode::InternalServerError,
            501 => StatusCode::NotImplemented,
            502 => StatusCode::BadGateway,
            503 => StatusCode::ServiceUnavailable,
            505 => StatusCode::HttpVersionNotSupported,
            _ => return None,
        };
        Some(status)
    }
}

/// Headers every response starts with. Explicit headers of the same name
/// replace these values but never remove the header.
const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("Content-Security-Policy", "default-src 'self'"),
    ("X-Frame-Options", "deny"),
    ("X-Content-Type-Options", "nosniff"),
    ("Referrer-Policy", "origin-when-cross-origin"),
    ("Server", "microhttp-rs"),
    ("Connection", "keep-alive"),
];

/// Represents an HTTP response.
///
/// A response is assembled by chaining the consuming `with_*` methods from
/// [`HttpResponse::new`]; once handed to the server it is only read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: Vec<(String, Vec<String>)>,
    body: Vec<u8>,
}

impl HttpResponse {
    /// Create a new HTTP response with the given status code and the default
    /// security, keep-alive and date headers.
    pub fn new(status: StatusCode) -> Self {
        let mut headers: Vec<(String, Vec<String>)> = DEFAULT_HEADERS
            .iter()
            .map(|(name, value)| (name.to_string(), vec![value.to_string()]))
            .collect();
        headers.push((
            "Date".to_string(),
            vec![httpdate::fmt_http_date(SystemTime::now())],
        ));
        headers.push(("Content-Type".to_string(), vec!["text/plain".to_string()]));

        Self {
            status,
            headers,
            body: Vec::new(),
        }
    }

    /// A plain-text response whose body is the status reason phrase.
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status).with_body_string(status.reason_phrase())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Headers in the order they will be written.
    pub fn headers(&self) -> &[(String, Vec<String>)] {
        &self.headers
    }

    /// All values of a header (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Set the response body with a string.
    pub fn with_body_string(mut self, body: impl Into<String>) -> Self {
        self.body = body.into().into_bytes();
        self
    }

    /// Set the response body with bytes.
    pub fn with_body_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Add or replace a header.
    pub fn with_header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_header_values(name, vec![value.into()])
    }

    /// Add or replace a header carrying several values, written joined by `;`.
    pub fn with_header_values(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        let name = name.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = values,
            None => self.headers.push((name, values)),
        }
        self
    }

    /// Set the content type.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// Set the response body with a JSON value.
    ///
    /// This method serializes the provided value to JSON and sets it as the response body.
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, Error> {
        let json = serde_json::to_vec(value)?;
        Ok(self
            .with_content_type("application/json")
            .with_body_bytes(json))
    }

    /// Serialize the response to wire bytes.
    ///
    /// `Content-Length` is always computed from the body and written only for
    /// a non-empty body; an explicitly set one is skipped.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(256 + self.body.len());

        let status_line = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status.as_u16(),
            self.status.reason_phrase()
        );
        bytes.extend_from_slice(status_line.as_bytes());

        for (name, values) in &self.headers {
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            let header_line = format!("{name}: {}\r\n", values.join(";"));
            bytes.extend_from_slice(header_line.as_bytes());
        }

        if self.body.is_empty() {
            bytes.extend_from_slice(b"\r\n");
        } else {
            let length_line = format!("Content-Length: {}\r\n\r\n", self.body.len());
            bytes.extend_from_slice(length_line.as_bytes());
            bytes.extend_from_slice(&self.body);
        }

        bytes
    }
}

/// Read the status code back from a serialized response's first line.
pub fn parse_status_line(bytes: &[u8]) -> Option<StatusCode> {
    let end = bytes.windows(2).position(|w| w == b"\r\n")?;
    let line = std::str::from_utf8(&bytes[..end]).ok()?;
    let mut parts = line.splitn(3, ' ');
    if parts.next()? != "HTTP/1.1" {
        return None;
    }
    let code = parts.next()?.parse().ok()?;
    StatusCode::from_u16(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_text(response: &HttpResponse) -> String {
        String::from_utf8(response.to_bytes()).unwrap()
    }

    #[test]
    fn test_default_headers() {
        let response = HttpResponse::new(StatusCode::Ok);
        let text = as_text(&response);
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Security-Policy: default-src 'self'\r\n"));
        assert!(text.contains("X-Frame-Options: deny\r\n"));
        assert!(text.contains("X-Content-Type-Options: nosniff\r\n"));
        assert!(text.contains("Referrer-Policy: origin-when-cross-origin\r\n"));
        assert!(text.contains("Server: microhttp-rs\r\n"));
        assert!(text.contains("Connection: keep-alive\r\n"));
        assert!(text.contains("Date: "));
        assert!(text.contains(" GMT\r\n"));
    }

    #[test]
    fn test_empty_body_has_no_length() {
        let text = as_text(&HttpResponse::new(StatusCode::NoContent));
        assert!(text.ends_with("\r\n\r\n"));
        assert!(!text.contains("Content-Length"));
    }

    #[test]
    fn test_body_length_counts_encoded_bytes() {
        let response = HttpResponse::new(StatusCode::Ok).with_body_string("héllo");
        let text = as_text(&response);
        assert!(text.contains("Content-Length: 6\r\n\r\nhéllo"));
        assert!(text.ends_with("héllo"));
    }

    #[test]
    fn test_explicit_length_is_ignored() {
        let response = HttpResponse::new(StatusCode::Ok)
            .with_header("Content-Length", "999")
            .with_body_string("abc");
        let text = as_text(&response);
        assert_eq!(text.matches("Content-Length").count(), 1);
        assert!(text.contains("Content-Length: 3\r\n"));
    }

    #[test]
    fn test_override_keeps_position() {
        let response = HttpResponse::new(StatusCode::Ok)
            .with_header("connection", "close")
            .with_header("X-Custom", "1");
        let names: Vec<&str> = response.headers().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names[5], "Connection");
        assert_eq!(names.last(), Some(&"X-Custom"));
        assert_eq!(response.get_header("Connection"), Some(&["close".to_string()][..]));
        assert_eq!(response.headers().len(), DEFAULT_HEADERS.len() + 3);
    }

    #[test]
    fn test_multi_value_header_joined() {
        let response = HttpResponse::new(StatusCode::Ok)
            .with_header_values("Cache-Control", vec!["no-cache".to_string(), "private".to_string()]);
        assert!(as_text(&response).contains("Cache-Control: no-cache;private\r\n"));
    }

    #[test]
    fn test_json_body() {
        #[derive(Serialize)]
        struct Book<'a> {
            title: &'a str,
        }

        let response = HttpResponse::new(StatusCode::Created)
            .with_json(&Book { title: "Dune" })
            .unwrap();
        assert_eq!(response.body(), br#"{"title":"Dune"}"#);
        assert_eq!(
            response.get_header("content-type"),
            Some(&["application/json".to_string()][..])
        );
    }

    #[test]
    fn test_status_line_round_trip() {
        for status in [
            StatusCode::Ok,
            StatusCode::BadRequest,
            StatusCode::NotFound,
            StatusCode::InternalServerError,
            StatusCode::HttpVersionNotSupported,
        ] {
            let bytes = HttpResponse::from_status(status).to_bytes();
            assert_eq!(parse_status_line(&bytes), Some(status));
        }
        assert_eq!(parse_status_line(b"HTTP/1.0 200 OK\r\n"), None);
    }
}
