//! A minimal HTTP/1.1 server library.
//!
//! microhttp-rs accepts connections on one acceptor thread and serves them on
//! a fixed set of worker threads, each running its own readiness loop. Requests
//! are matched against a routing trie with literal, `{param}` and `*`
//! segments, and answered by synchronous handlers.
//!
//! # Features
//!
//! - Parse HTTP/1.1 requests from byte slices, with query strings, cookies and bodies
//! - Route on method and path, with path parameters and wildcards
//! - Keep-alive and pipelined requests on a single connection
//! - Pooled, fixed-size read buffers
//! - JSON bodies through serde
//!
//! # Examples
//!
//! ## Parsing a request
//!
//! ```
//! use microhttp_rs::{parse_request, Method};
//!
//! let request_bytes = b"GET /books?sort=title HTTP/1.1\r\nCookie: session=abc\r\n\r\n";
//!
//! let request = parse_request(request_bytes).unwrap();
//! assert_eq!(request.method(), Method::GET);
//! assert_eq!(request.path(), "/books");
//! assert_eq!(request.get_query_param("sort"), Some("title"));
//! assert_eq!(request.get_cookie("session"), Some("abc"));
//! ```
//!
//! ## Error handling
//!
//! ```
//! use microhttp_rs::{parse_request, ParserError};
//!
//! let invalid_request = b"INVALID /index.html HTTP/1.1\r\n\r\n";
//!
//! match parse_request(invalid_request) {
//!     Ok(_) => println!("Request parsed successfully"),
//!     Err(ParserError::InvalidMethod(method)) => println!("Invalid method: {}", method),
//!     Err(err) => println!("Other error ({}): {}", err.status_code(), err),
//! }
//! ```
//!
//! ## Serving routes
//!
//! ```no_run
//! use microhttp_rs::{HttpResponse, HttpServer, Method, ServerConfig, StatusCode};
//!
//! let mut server = HttpServer::new(ServerConfig::default());
//! server
//!     .add_route("/books/{id}", Method::GET, |_req, params| {
//!         Ok(HttpResponse::new(StatusCode::Ok).with_body_string(format!("book {}", params["id"])))
//!     })
//!     .unwrap();
//!
//! let addr = server.start().unwrap();
//! println!("listening on {addr}");
//! server.stop();
//! ```
//!
//! ## JSON support
//!
//! ```
//! use microhttp_rs::{HttpResponse, StatusCode};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Book {
//!     title: String,
//! }
//!
//! let response = HttpResponse::new(StatusCode::Ok)
//!     .with_json(&Book { title: "Dune".to_string() })
//!     .unwrap();
//! assert_eq!(response.get_header("Content-Type"), Some(&["application/json".to_string()][..]));
//! ```
//!
//! See `demos/books.rs` for a complete server.

pub mod parser;

pub mod server;

// Re-export commonly used items for convenience
pub use parser::{parse_request, Error as ParserError, HttpRequest, HttpVersion, Method, RequestBody};
pub use server::{
    BufferPool, Error as ServerError, Handler, HttpResponse, HttpServer, PathParameters, Router,
    ServerConfig, StatusCode,
};
