//! HTTP server: route registration, startup and shutdown.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, info, warn};
use mio::net::TcpListener;
use mio::Waker;

use crate::parser::{HttpRequest, Method};
use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::handler::{Handler, PathParameters};
use crate::server::pool::BufferPool;
use crate::server::response::HttpResponse;
use crate::server::router::Router;
use crate::server::worker::{Acceptor, Inbox, Worker};

/// Threads and wake handles of a started server.
struct Running {
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    acceptor_waker: Option<Arc<Waker>>,
    inboxes: Vec<Arc<Inbox>>,
    threads: Vec<JoinHandle<()>>,
}

impl Running {
    /// Signal every loop, then wait up to `grace` for the threads to exit.
    fn shutdown(self, grace: Duration) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(waker) = &self.acceptor_waker {
            if let Err(e) = waker.wake() {
                error!("Failed to wake acceptor: {e}");
            }
        }
        for inbox in &self.inboxes {
            if let Err(e) = inbox.wake() {
                error!("Failed to wake worker: {e}");
            }
        }

        let deadline = Instant::now() + grace;
        for handle in self.threads {
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
            let name = handle.thread().name().unwrap_or("unnamed").to_string();
            if !handle.is_finished() {
                warn!("Thread {name} did not stop within {grace:?}, detaching it");
                continue;
            }
            if handle.join().is_err() {
                error!("Thread {name} panicked");
            }
        }
    }
}

/// An HTTP server.
///
/// Routes are registered first; [`HttpServer::start`] then binds the
/// configured address and returns while the acceptor and worker threads run
/// in the background until [`HttpServer::stop`] (or drop).
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    router: Arc<Router>,
    running: Option<Running>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            router: Arc::new(Router::new()),
            running: None,
        }
    }

    /// Add a route served by a closure.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRoute`] for a malformed pattern,
    /// [`Error::AlreadyStarted`] once the server is running.
    pub fn add_route<F>(&mut self, pattern: &str, method: Method, handler: F) -> Result<(), Error>
    where
        F: Fn(HttpRequest, PathParameters) -> Result<HttpResponse, Error> + Send + Sync + 'static,
    {
        self.add_handler(pattern, method, handler)
    }

    /// Add a route served by any [`Handler`] implementation.
    pub fn add_handler<H: Handler>(&mut self, pattern: &str, method: Method, handler: H) -> Result<(), Error> {
        if self.running.is_some() {
            return Err(Error::AlreadyStarted);
        }
        let router = Arc::get_mut(&mut self.router).ok_or(Error::AlreadyStarted)?;
        router.add(pattern, method, Arc::new(handler))
    }

    /// The route table.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Log the bound address and registered endpoints.
    fn display_server_info(&self, addr: SocketAddr, workers: usize) {
        info!("Server listening on http://{addr} with {workers} workers");
        info!("Registered endpoints:");
        for (method, pattern) in self.router.routes() {
            info!("  {method} {pattern}");
        }
    }

    /// Bind the listener and start the acceptor and worker threads.
    ///
    /// Returns the bound address without waiting for any connection.
    pub fn start(&mut self) -> Result<SocketAddr, Error> {
        if self.running.is_some() {
            return Err(Error::AlreadyStarted);
        }

        let listener = TcpListener::bind(self.config.addr)?;
        let local_addr = listener.local_addr()?;
        let worker_count = self.config.workers.max(1);

        let pool = Arc::new(BufferPool::new(
            self.config.buffer_count,
            self.config.buffer_capacity,
        ));
        let mut running = Running {
            local_addr,
            shutdown: Arc::new(AtomicBool::new(false)),
            acceptor_waker: None,
            inboxes: Vec::with_capacity(worker_count),
            threads: Vec::with_capacity(worker_count + 1),
        };

        if let Err(e) = self.spawn_loops(listener, pool, worker_count, &mut running) {
            running.shutdown(self.config.shutdown_grace);
            return Err(e);
        }

        self.display_server_info(local_addr, worker_count);
        self.running = Some(running);
        Ok(local_addr)
    }

    fn spawn_loops(
        &self,
        listener: TcpListener,
        pool: Arc<BufferPool>,
        worker_count: usize,
        running: &mut Running,
    ) -> Result<(), Error> {
        for id in 0..worker_count {
            let (worker, inbox) = Worker::new(
                id,
                Arc::clone(&self.router),
                Arc::clone(&pool),
                Arc::clone(&running.shutdown),
                self.config.events_capacity,
            )?;
            running.inboxes.push(inbox);
            let handle = thread::Builder::new()
                .name(format!("microhttp-worker-{id}"))
                .spawn(move || worker.run())?;
            running.threads.push(handle);
        }

        let (acceptor, waker) = Acceptor::new(
            listener,
            running.inboxes.clone(),
            Arc::clone(&running.shutdown),
        )?;
        running.acceptor_waker = Some(waker);
        let handle = thread::Builder::new()
            .name("microhttp-acceptor".to_string())
            .spawn(move || acceptor.run())?;
        running.threads.push(handle);
        Ok(())
    }

    /// Stop accepting, close every open connection and join the threads,
    /// waiting at most `config.shutdown_grace`.
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        info!("Shutting down server...");
        running.shutdown(self.config.shutdown_grace);
        info!("Server shutdown complete");
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        self.stop();
    }
}
