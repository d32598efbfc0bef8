//! HTTP server implementation for microhttp-rs.
//!
//! A readiness-driven server: one acceptor thread hands sockets to worker
//! threads, each running its own `mio` event loop over the connections it
//! owns. Requests are routed through a [`Router`] trie and answered by
//! synchronous [`Handler`]s.

mod config;
mod connection;
mod error;
mod handler;
mod http_server;
mod pool;
mod response;
mod router;
mod worker;

// Re-export public items
pub use config::ServerConfig;
pub use connection::{dispatch, Connection, State};
pub use error::Error;
pub use handler::{Handler, HandlerFn, PathParameters};
pub use http_server::HttpServer;
pub use pool::{Buffer, BufferPool};
pub use response::{parse_status_line, HttpResponse, StatusCode};
pub use router::Router;
pub use worker::worker_index;
