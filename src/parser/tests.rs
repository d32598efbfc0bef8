//! Tests for the HTTP parser.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use serde::{Deserialize, Serialize};

    use crate::parser::{frame, parse_request, Error, Frame, HttpRequest, HttpVersion, Method};

    #[test]
    fn test_parse_simple_get_request() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.method(), Method::GET);
        assert_eq!(result.path(), "/index.html");
        assert_eq!(result.version(), HttpVersion::Http11);
        assert_eq!(result.get_header("host"), Some("example.com"));
        assert!(result.body().is_empty());
    }

    #[test]
    fn test_host_header_is_optional() {
        let request = b"GET /books HTTP/1.1\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert!(result.headers().is_empty());
    }

    #[test]
    fn test_case_insensitive_headers() {
        let request = b"GET / HTTP/1.1\r\nContent-Type: application/json\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.get_header("content-type"), Some("application/json"));
        assert_eq!(result.get_header("CONTENT-TYPE"), Some("application/json"));
        assert!(result.headers().contains_key("content-type"));
        assert!(!result.headers().contains_key("Content-Type"));
    }

    #[test]
    fn test_invalid_method() {
        let request = b"INVALID /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidMethod(ref m)) if m == "INVALID"));
    }

    #[test]
    fn test_unsupported_versions() {
        for version in ["HTTP/1.0", "HTTP/2", "HTTP/9.9"] {
            let request = format!("GET / {version}\r\nHost: example.com\r\n\r\n");
            let err = parse_request(request.as_bytes()).unwrap_err();
            assert!(matches!(err, Error::UnsupportedVersion(ref v) if v == version));
            assert_eq!(err.status_code(), 505);
        }
    }

    #[test]
    fn test_version_checked_before_method() {
        let err = parse_request(b"BREW /pot HTTP/1.0\r\n\r\n").unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(_)));
    }

    #[test]
    fn test_invalid_header_format() {
        let request = b"GET /index.html HTTP/1.1\r\nInvalidHeader\r\n\r\n";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidHeaderFormat(_))));

        let result = parse_request(b"GET / HTTP/1.1\r\n: no-name\r\n\r\n");
        assert!(matches!(result, Err(Error::InvalidHeaderFormat(_))));
    }

    #[test]
    fn test_empty_request() {
        assert!(matches!(parse_request(b""), Err(Error::EmptyRequest)));
        assert!(matches!(parse_request(b"\r\n\r\n"), Err(Error::EmptyRequest)));
    }

    #[test]
    fn test_malformed_request_lines() {
        for line in [
            &b"GET\r\n\r\n"[..],
            b"GET  /index.html  HTTP/1.1\r\n\r\n",
            b"GET  HTTP/1.1\r\n\r\n",
            b" GET / HTTP/1.1\r\n\r\n",
            b"GET / HTTP/1.1 extra\r\n\r\n",
        ] {
            let result = parse_request(line);
            assert!(
                matches!(result, Err(Error::MalformedRequestLine(_))),
                "{:?}",
                String::from_utf8_lossy(line)
            );
            assert_eq!(result.unwrap_err().status_code(), 400);
        }
    }

    #[test]
    fn test_all_methods() {
        let methods = [
            ("GET", Method::GET),
            ("PUT", Method::PUT),
            ("PATCH", Method::PATCH),
            ("DELETE", Method::DELETE),
            ("HEAD", Method::HEAD),
            ("OPTIONS", Method::OPTIONS),
        ];

        for (token, expected_method) in methods {
            let request = format!("{token} /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n");
            let result = parse_request(request.as_bytes()).unwrap();
            assert_eq!(result.method(), expected_method);
            assert_eq!(expected_method.to_string(), token);
        }
    }

    #[test]
    fn test_headers_with_multiple_colons() {
        let request = b"GET /index.html HTTP/1.1\r\nX-Test: value:with:colons\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.get_header("x-test"), Some("value:with:colons"));
    }

    #[test]
    fn test_headers_with_trailing_whitespace() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com  \r\nUser-Agent:  test  \r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.get_header("Host"), Some("example.com"));
        assert_eq!(result.get_header("User-Agent"), Some("test"));
    }

    #[test]
    fn test_mixed_line_endings() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\nUser-Agent: test\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.get_header("host"), Some("example.com"));
        assert_eq!(result.get_header("user-agent"), Some("test"));
    }

    #[test]
    fn test_duplicate_headers() {
        let request = b"GET / HTTP/1.1\r\nX-Test: value1\r\nX-Test: value2\r\n\r\n";
        let result = parse_request(request).unwrap();
        // The last value wins
        assert_eq!(result.get_header("x-test"), Some("value2"));
    }

    #[test]
    fn test_empty_header_value() {
        let request = b"GET / HTTP/1.1\r\nX-Empty:\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.get_header("x-empty"), Some(""));
    }

    #[test]
    fn test_path_with_query_parameters() {
        let request = b"GET /search?q=test%20query&page=1&flag&empty= HTTP/1.1\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.path(), "/search");
        assert_eq!(result.target(), "/search?q=test%20query&page=1&flag&empty=");
        assert_eq!(result.get_query_param("q"), Some("test query"));
        assert_eq!(result.get_query_param("page"), Some("1"));
        assert_eq!(result.get_query_param("empty"), Some(""));
        assert!(!result.has_query_param("flag"));
    }

    #[test]
    fn test_cookies_accept_and_content_type() {
        let request = b"GET / HTTP/1.1\r\n\
            Cookie: session=abc123; theme=dark; broken; session=other\r\n\
            Accept: text/html\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.get_cookie("session"), Some("abc123"));
        assert_eq!(result.get_cookie("theme"), Some("dark"));
        assert_eq!(result.cookies().len(), 2);
        assert_eq!(result.accept(), "text/html");
        assert_eq!(result.content_type(), "text/plain");

        let defaults = parse_request(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(defaults.accept(), "*/*");
        assert!(defaults.cookies().is_empty());
    }

    #[test]
    fn test_body_sliced_by_content_length() {
        let request = b"PUT /books/1 HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello world";
        let result = parse_request(request).unwrap();
        assert_eq!(result.body().raw(), b"hello");
    }

    #[test]
    fn test_short_body_is_bad_request() {
        let request = b"PUT /books/1 HTTP/1.1\r\nContent-Length: 5\r\n\r\nabc";
        let err = parse_request(request).unwrap_err();
        assert!(matches!(err, Error::BodyLengthMismatch { declared: 5, available: 3 }));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_invalid_content_length() {
        for value in ["-1", "abc", "1.5"] {
            let request = format!("PUT / HTTP/1.1\r\nContent-Length: {value}\r\n\r\n");
            let result = parse_request(request.as_bytes());
            assert!(matches!(result, Err(Error::InvalidContentLength(_))));
        }
    }

    #[test]
    fn test_conflicting_content_lengths() {
        let request = b"POST /books HTTP/1.1\r\nContent-Length: 10\r\nContent-Length: 2\r\n\r\nabcdefghij";
        let result = parse_request(request);
        assert!(matches!(result, Err(Error::InvalidContentLength(_))));

        // Framing stops at the head, so no body bytes are taken for the next request
        assert_eq!(frame(request), Frame::Complete(request.len() - 10));
    }

    #[test]
    fn test_repeated_matching_content_length() {
        let request = b"POST /books HTTP/1.1\r\nContent-Length: 4\r\ncontent-length: 4\r\n\r\nDune";
        let result = parse_request(request).unwrap();
        assert_eq!(result.body().raw(), b"Dune");
    }

    #[test]
    fn test_body_without_content_length_is_ignored() {
        let request = b"PUT /books/1 HTTP/1.1\r\n\r\nstray";
        let result = parse_request(request).unwrap();
        assert!(result.body().is_empty());
    }

    #[test]
    fn test_post_requires_body() {
        let empty = b"POST /books HTTP/1.1\r\nContent-Length: 0\r\n\r\n";
        assert!(matches!(parse_request(empty), Err(Error::EmptyBody)));

        let blank = b"POST /books HTTP/1.1\r\nContent-Length: 3\r\n\r\n \r\n";
        assert!(matches!(parse_request(blank), Err(Error::EmptyBody)));

        let missing = b"POST /books HTTP/1.1\r\n\r\n";
        assert!(matches!(parse_request(missing), Err(Error::EmptyBody)));

        let ok = b"POST /books HTTP/1.1\r\nContent-Length: 2\r\n\r\n{}";
        assert_eq!(parse_request(ok).unwrap().body().raw(), b"{}");
    }

    #[test]
    fn test_other_methods_accept_empty_body() {
        let request = b"DELETE /books/1 HTTP/1.1\r\nContent-Length: 0\r\n\r\n";
        assert!(parse_request(request).is_ok());
    }

    #[test]
    fn test_keep_alive_detection() {
        let cases = [
            ("Connection: keep-alive\r\n", true),
            ("Connection: Keep-Alive\r\n", true),
            ("Connection: upgrade; keep-alive\r\n", true),
            ("Connection: close\r\n", false),
            ("", false),
        ];
        for (header, expected) in cases {
            let request = format!("GET / HTTP/1.1\r\n{header}\r\n");
            let result = parse_request(request.as_bytes()).unwrap();
            assert_eq!(result.is_keep_alive(), expected, "{header:?}");
        }
    }

    #[test]
    fn test_malformed_utf8_in_header_is_tolerated() {
        let request = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\nX-Test: \xFF\xFF\r\n\r\n";
        let result = parse_request(request).unwrap();
        assert_eq!(result.get_header("host"), Some("example.com"));
        assert!(result.has_header("x-test"));
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestUser {
        name: String,
        email: String,
    }

    #[test]
    fn test_json_parsing() {
        let mut headers = HashMap::new();
        headers.insert("Host".to_string(), "example.com".to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let body = r#"{"name":"John Doe","email":"john@example.com"}"#.as_bytes().to_vec();
        let request = HttpRequest::new(Method::POST, "/api/users", HttpVersion::Http11, headers.clone(), body.clone());

        assert!(request.is_json());
        assert_eq!(request.get_header("HOST"), Some("example.com"));
        let user: TestUser = request.json().unwrap();
        assert_eq!(user.name, "John Doe");
        assert_eq!(user.email, "john@example.com");

        // Wrong content type
        let mut headers_no_json = headers.clone();
        headers_no_json.insert("Content-Type".to_string(), "text/plain".to_string());
        let request_no_json = HttpRequest::new(Method::POST, "/api/users", HttpVersion::Http11, headers_no_json, body);
        let result: Result<TestUser, _> = request_no_json.json();
        assert!(matches!(result, Err(Error::UnexpectedContentType(_))));

        // Invalid JSON
        let invalid_body = r#"{"name":"John Doe","email":}"#.as_bytes().to_vec();
        let request_invalid_json = HttpRequest::new(Method::POST, "/api/users", HttpVersion::Http11, headers, invalid_body);
        let result: Result<TestUser, _> = request_invalid_json.json();
        assert!(matches!(result, Err(Error::JsonError(_))));
    }

    #[test]
    fn test_complex_request() {
        let body = r#"{"name":"John Doe","email":"john@example.com"}"#;
        let request = format!(
            "POST /api/users?role=admin HTTP/1.1\r\n\
            Host: example.com\r\n\
            User-Agent: test-client/1.0\r\n\
            Content-Type: application/json\r\n\
            Content-Length: {}\r\n\
            X-API-Key: secret-key\r\n\
            \r\n\
            {body}",
            body.len()
        );

        assert_eq!(frame(request.as_bytes()), Frame::Complete(request.len()));

        let result = parse_request(request.as_bytes()).unwrap();
        assert_eq!(result.method(), Method::POST);
        assert_eq!(result.path(), "/api/users");
        assert_eq!(result.get_query_param("role"), Some("admin"));
        assert_eq!(result.get_header("x-api-key"), Some("secret-key"));
        assert_eq!(result.content_type(), "application/json");
        let user: TestUser = result.json().unwrap();
        assert_eq!(user.email, "john@example.com");
    }
}
