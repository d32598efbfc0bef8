//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::thread;
use std::time::Duration;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address to bind to. Port 0 picks a free port.
    pub addr: SocketAddr,
    /// Number of worker event loops, not counting the acceptor.
    pub workers: usize,
    /// Number of buffers the pool preallocates; bounds open connections.
    pub buffer_count: usize,
    /// Capacity of each pooled buffer, the largest request accepted.
    pub buffer_capacity: usize,
    /// Readiness events drained per poll call.
    pub events_capacity: usize,
    /// How long `stop` waits for the event loops to exit.
    pub shutdown_grace: Duration,
}

impl ServerConfig {
    /// Default configuration bound to `addr`.
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            addr,
            ..Self::default()
        }
    }
}

/// Two loops per processor, one of which is the acceptor.
fn default_workers() -> usize {
    let cpus = thread::available_parallelism().map_or(1, |n| n.get());
    (cpus * 2 - 1).max(1)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8090)),
            workers: default_workers(),
            buffer_count: 1024,
            buffer_capacity: 8192,
            events_capacity: 1024,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}
