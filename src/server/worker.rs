//! Event loops: one acceptor and N workers, each on its own thread.
//!
//! The acceptor owns the listening socket. Every accepted stream is pushed to
//! one worker, chosen by hashing the peer address, and stays with that worker
//! until it closes. A worker owns one `mio::Poll` and a slab of connections
//! indexed by their poll token; it runs every state transition inline on its
//! own thread.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_queue::SegQueue;
use log::{debug, error, info, warn};
use mio::event::Event;
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};
use slab::Slab;

use crate::server::connection::Connection;
use crate::server::pool::BufferPool;
use crate::server::router::Router;

const LISTENER: Token = Token(0);
const ACCEPTOR_WAKE: Token = Token(1);
const WORKER_WAKE: Token = Token(usize::MAX);

/// Pick the worker for a new connection; the same peer always maps to the
/// same worker.
pub fn worker_index(peer: &SocketAddr, workers: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    peer.hash(&mut hasher);
    (hasher.finish() % workers.max(1) as u64) as usize
}

/// Streams waiting to be adopted by a worker, plus the waker that tells the
/// worker to look.
pub struct Inbox {
    queue: SegQueue<TcpStream>,
    waker: Waker,
}

impl Inbox {
    /// Hand a stream over and wake the worker.
    pub fn push(&self, stream: TcpStream) -> io::Result<()> {
        self.queue.push(stream);
        self.waker.wake()
    }

    pub fn wake(&self) -> io::Result<()> {
        self.waker.wake()
    }
}

/// One reactor thread and the connections it owns.
pub struct Worker {
    id: usize,
    poll: Poll,
    inbox: Arc<Inbox>,
    connections: Slab<Connection<TcpStream>>,
    router: Arc<Router>,
    pool: Arc<BufferPool>,
    shutdown: Arc<AtomicBool>,
    events_capacity: usize,
}

impl Worker {
    pub fn new(
        id: usize,
        router: Arc<Router>,
        pool: Arc<BufferPool>,
        shutdown: Arc<AtomicBool>,
        events_capacity: usize,
    ) -> io::Result<(Self, Arc<Inbox>)> {
        let poll = Poll::new()?;
        let waker = Waker::new(poll.registry(), WORKER_WAKE)?;
        let inbox = Arc::new(Inbox {
            queue: SegQueue::new(),
            waker,
        });

        let worker = Self {
            id,
            poll,
            inbox: Arc::clone(&inbox),
            connections: Slab::new(),
            router,
            pool,
            shutdown,
            events_capacity,
        };
        Ok((worker, inbox))
    }

    /// Run until shutdown is signalled, then close every owned connection.
    pub fn run(mut self) {
        let mut events = Events::with_capacity(self.events_capacity);
        debug!("Worker {} started", self.id);

        while !self.shutdown.load(Ordering::Acquire) {
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == ErrorKind::Interrupted {
                    continue;
                }
                error!("Worker {} poll failed: {e}", self.id);
                break;
            }

            for event in events.iter() {
                match event.token() {
                    WORKER_WAKE => self.adopt_incoming(),
                    token => self.ready(token, event),
                }
            }
        }

        self.close_all();
        debug!("Worker {} stopped", self.id);
    }

    /// Register every stream the acceptor handed over.
    fn adopt_incoming(&mut self) {
        while let Some(mut stream) = self.inbox.queue.pop() {
            let buffer = match self.pool.acquire() {
                Ok(buffer) => buffer,
                Err(e) => {
                    warn!("Worker {} dropping new connection: {e}", self.id);
                    continue;
                }
            };

            let entry = self.connections.vacant_entry();
            let token = Token(entry.key());
            if let Err(e) = self
                .poll
                .registry()
                .register(&mut stream, token, Interest::READABLE)
            {
                error!("Worker {} failed to register connection: {e}", self.id);
                self.pool.release(buffer);
                continue;
            }
            entry.insert(Connection::new(stream, buffer));
        }
    }

    /// Run the transition a readiness event calls for.
    fn ready(&mut self, token: Token, event: &Event) {
        let Some(conn) = self.connections.get_mut(token.0) else {
            return;
        };
        let before = conn.interest();

        if event.is_error() {
            conn.close();
        } else if before == Some(Interest::READABLE) && (event.is_readable() || event.is_read_closed()) {
            conn.on_readable(&self.router);
        } else if before == Some(Interest::WRITABLE) && (event.is_writable() || event.is_write_closed()) {
            conn.on_writable(&self.router);
        }

        match conn.interest() {
            None => self.remove(token),
            Some(interest) if Some(interest) != before => {
                let result = self
                    .poll
                    .registry()
                    .reregister(conn.stream_mut(), token, interest);
                if let Err(e) = result {
                    debug!("Worker {} failed to reregister connection: {e}", self.id);
                    self.remove(token);
                }
            }
            Some(_) => {}
        }
    }

    /// Tear a connection down: deregister, close the socket, free the buffer.
    fn remove(&mut self, token: Token) {
        let mut conn = self.connections.remove(token.0);
        let _ = self.poll.registry().deregister(conn.stream_mut());
        self.pool.release(conn.into_buffer());
    }

    fn close_all(&mut self) {
        let open = self.connections.len();
        for mut conn in self.connections.drain() {
            let _ = self.poll.registry().deregister(conn.stream_mut());
            self.pool.release(conn.into_buffer());
        }
        while self.inbox.queue.pop().is_some() {}
        if open > 0 {
            info!("Worker {} closed {open} open connections", self.id);
        }
    }
}

/// The loop that owns the listening socket.
pub struct Acceptor {
    poll: Poll,
    listener: TcpListener,
    workers: Vec<Arc<Inbox>>,
    shutdown: Arc<AtomicBool>,
}

impl Acceptor {
    /// Returns the acceptor and the waker that interrupts its poll.
    pub fn new(
        mut listener: TcpListener,
        workers: Vec<Arc<Inbox>>,
        shutdown: Arc<AtomicBool>,
    ) -> io::Result<(Self, Arc<Waker>)> {
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let waker = Arc::new(Waker::new(poll.registry(), ACCEPTOR_WAKE)?);

        let acceptor = Self {
            poll,
            listener,
            workers,
            shutdown,
        };
        Ok((acceptor, waker))
    }

    pub fn run(mut self) {
        let mut events = Events::with_capacity(128);

        while !self.shutdown.load(Ordering::Acquire) {
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == ErrorKind::Interrupted {
                    continue;
                }
                error!("Acceptor poll failed: {e}");
                break;
            }

            for event in events.iter() {
                if event.token() == LISTENER {
                    self.accept_ready();
                }
            }
        }
        debug!("Acceptor stopped");
    }

    /// Accept until the listener would block.
    fn accept_ready(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    let index = worker_index(&peer, self.workers.len());
                    debug!("Accepted {peer}, assigned to worker {index}");
                    if let Err(e) = self.workers[index].push(stream) {
                        error!("Failed to wake worker {index}: {e}");
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    error!("Error accepting connection: {e}");
                    break;
                }
            }
        }
    }
}
