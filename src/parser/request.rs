//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::str::FromStr;

use serde::de::DeserializeOwned;

use crate::parser::body::{decode_pairs, RequestBody};
use crate::parser::error::Error;
use crate::parser::frame::head_end;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

const DEFAULT_ACCEPT: &str = "*/*";
const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Represents a parsed HTTP request.
///
/// Built once by [`parse_request`] (or [`HttpRequest::new`]) and read-only
/// afterwards.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    target: String,
    path: String,
    version: HttpVersion,
    headers: HashMap<String, String>,
    query_params: HashMap<String, String>,
    cookies: HashMap<String, String>,
    accept: String,
    content_type: String,
    body: RequestBody,
}

impl HttpRequest {
    /// Create a new HTTP request.
    ///
    /// # Arguments
    ///
    /// * `method` - The HTTP method
    /// * `target` - The request target, possibly with a query string
    /// * `version` - The HTTP version
    /// * `headers` - The HTTP headers; names are lowercased here
    /// * `body` - The raw request body
    ///
    /// The path, query parameters, cookies, `accept` and `content-type`
    /// fields are derived from `target` and `headers`.
    pub fn new(
        method: Method,
        target: impl Into<String>,
        version: HttpVersion,
        headers: HashMap<String, String>,
        body: Vec<u8>,
    ) -> Self {
        let target = target.into();
        let headers: HashMap<String, String> = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        let (path, query_params) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), decode_pairs(query.as_bytes())),
            None => (target.clone(), HashMap::new()),
        };

        let cookies = headers
            .get("cookie")
            .map(|header| parse_cookies(header))
            .unwrap_or_default();
        let accept = headers
            .get("accept")
            .cloned()
            .unwrap_or_else(|| DEFAULT_ACCEPT.to_string());
        let content_type = headers
            .get("content-type")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let body = RequestBody::new(content_type.clone(), body);

        Self {
            method,
            target,
            path,
            version,
            headers,
            query_params,
            cookies,
            accept,
            content_type,
            body,
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The request path with the query string stripped.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request target exactly as it appeared on the request line.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// All headers, keyed by lowercased name.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Get a header value (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Check if a header exists (case-insensitive).
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    /// Get a decoded query parameter value.
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Check if a query parameter exists.
    pub fn has_query_param(&self, name: &str) -> bool {
        self.query_params.contains_key(name)
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// Get a cookie sent in the `Cookie` header.
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    /// The `Accept` header, `*/*` when absent.
    pub fn accept(&self) -> &str {
        &self.accept
    }

    /// The `Content-Type` header, `text/plain` when absent.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Parse the request body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        self.body.json()
    }

    /// Check if the request has a JSON body.
    pub fn is_json(&self) -> bool {
        self.body.is_json()
    }

    /// Whether the client asked to keep the connection open.
    ///
    /// The `Connection` header is split on `;` and any part equal to
    /// `keep-alive` (ignoring case) enables it.
    pub fn is_keep_alive(&self) -> bool {
        self.get_header("connection").is_some_and(|value| {
            value
                .split(';')
                .any(|token| token.trim().eq_ignore_ascii_case("keep-alive"))
        })
    }
}

/// Parse a `Cookie` header into name/value pairs; the first occurrence wins.
fn parse_cookies(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for cookie in header.split(';') {
        let mut parts = cookie.trim().split('=');
        if let (Some(name), Some(value), None) = (parts.next(), parts.next(), parts.next()) {
            cookies
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
    }
    cookies
}

/// Parse an HTTP request from a byte slice.
///
/// `input` must hold one request: the header block and, when a
/// `content-length` header is present, at least that many body bytes. Extra
/// bytes after the declared body are ignored.
///
/// # Returns
///
/// The parsed HTTP request, or the protocol error describing why the bytes
/// are not a valid HTTP/1.1 request.
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    if input.is_empty() {
        return Err(Error::EmptyRequest);
    }

    let (head, rest) = match head_end(input) {
        Some(end) => (&input[..end], &input[end..]),
        None => (input, &input[input.len()..]),
    };
    let head = String::from_utf8_lossy(head);
    let mut lines = head.lines();

    let request_line = match lines.next() {
        Some(line) if !line.is_empty() => line,
        _ => return Err(Error::EmptyRequest),
    };

    // Exactly three tokens separated by single spaces
    let parts: Vec<&str> = request_line.split(' ').collect();
    if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
        return Err(Error::MalformedRequestLine(request_line.to_string()));
    }

    let version = HttpVersion::from_str(parts[2])?;
    if !version.is_supported() {
        return Err(Error::UnsupportedVersion(parts[2].to_string()));
    }

    let method = Method::from_str(parts[0])?;
    let target = parts[1];

    let mut headers: HashMap<String, String> = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }

        let (name, value) = match line.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => (name, value),
            _ => return Err(Error::InvalidHeaderFormat(line.to_string())),
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim().to_string();
        // Repeated content-length headers must agree
        if name == "content-length" {
            if let Some(previous) = headers
                .get(&name)
                .filter(|previous| previous.parse::<usize>().ok() != value.parse().ok())
            {
                return Err(Error::InvalidContentLength(format!("{previous}, {value}")));
            }
        }
        headers.insert(name, value);
    }

    let body = match headers.get("content-length") {
        Some(value) => {
            let declared: usize = value
                .parse()
                .map_err(|_| Error::InvalidContentLength(value.clone()))?;
            if rest.len() < declared {
                return Err(Error::BodyLengthMismatch {
                    declared,
                    available: rest.len(),
                });
            }
            rest[..declared].to_vec()
        }
        None => Vec::new(),
    };

    let request = HttpRequest::new(method, target, version, headers, body);
    if method.requires_body() && request.body().is_blank() {
        return Err(Error::EmptyBody);
    }

    Ok(request)
}
