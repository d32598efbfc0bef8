//! Per-connection state machine.
//!
//! A connection alternates between reading a request and writing its
//! response. Everything in between (framing, parsing, routing, calling the
//! handler, serializing) runs inline when the last byte of a request has been
//! read, so only two states persist across readiness events:
//!
//! ```text
//! AwaitingRequest --(request framed, response ready)--> Writing
//! Writing --(flushed, keep-alive)--> AwaitingRequest
//! Writing --(flushed, no keep-alive)--> Closed
//! any --(I/O error)--> Closed
//! ```
//!
//! When the peer half-closes, requests already buffered are still answered;
//! the connection closes once nothing is left to write.

use std::io::{self, ErrorKind, Read, Write};
use std::panic::{self, AssertUnwindSafe};

use log::{debug, error};
use mio::Interest;

use crate::parser::{self, frame, parse_request, required_len, Frame, HttpRequest};
use crate::server::pool::Buffer;
use crate::server::response::{HttpResponse, StatusCode};
use crate::server::router::Router;

/// Where a connection is in its request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Reading bytes until a whole request is buffered.
    AwaitingRequest,
    /// A serialized response is (partially) written.
    Writing,
    /// The connection is finished and must be dropped.
    Closed,
}

enum Fill {
    /// The socket has no more bytes for now.
    Drained,
    /// The buffer has no spare room left.
    Full,
    /// The peer closed its side.
    Eof,
}

/// One client connection, owned by a single worker.
pub struct Connection<S> {
    stream: S,
    input: Buffer,
    output: Vec<u8>,
    written: usize,
    keep_alive: bool,
    /// The peer will send nothing more.
    peer_closed: bool,
    state: State,
}

impl<S: Read + Write> Connection<S> {
    /// Wrap an accepted stream; `input` is the pooled buffer requests are read into.
    pub fn new(stream: S, input: Buffer) -> Self {
        Self {
            stream,
            input,
            output: Vec::new(),
            written: 0,
            keep_alive: false,
            peer_closed: false,
            state: State::AwaitingRequest,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The readiness this connection waits for, `None` once closed.
    pub fn interest(&self) -> Option<Interest> {
        match self.state {
            State::AwaitingRequest => Some(Interest::READABLE),
            State::Writing => Some(Interest::WRITABLE),
            State::Closed => None,
        }
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Bytes read but not yet consumed by a request.
    pub fn buffered(&self) -> &[u8] {
        self.input.filled()
    }

    /// Give the input buffer back, e.g. to return it to the pool.
    pub fn into_buffer(self) -> Buffer {
        self.input
    }

    /// Mark the connection as finished.
    pub fn close(&mut self) {
        self.state = State::Closed;
    }

    /// Handle read readiness: drain the socket, then answer every complete
    /// request in the buffer, one at a time.
    pub fn on_readable(&mut self, router: &Router) {
        while self.state == State::AwaitingRequest {
            let fill = match self.fill() {
                Ok(fill) => fill,
                Err(e) => {
                    debug!("Read failed, closing connection: {e}");
                    return self.close();
                }
            };
            if let Fill::Eof = fill {
                self.peer_closed = true;
                return self.finish_buffered(router);
            }

            self.process(router);

            if self.state != State::AwaitingRequest {
                return;
            }
            match fill {
                Fill::Full if self.input.is_full() => {
                    let capacity = self.input.capacity();
                    self.reject(&parser::Error::RequestTooLarge(capacity));
                }
                Fill::Full => {}
                _ => return,
            }
        }
    }

    /// Handle write readiness: continue flushing the pending response and,
    /// on keep-alive, move on to any request already buffered.
    pub fn on_writable(&mut self, router: &Router) {
        if self.state != State::Writing {
            return;
        }
        self.flush();
        if self.state != State::AwaitingRequest {
            return;
        }
        if self.peer_closed {
            self.finish_buffered(router);
        } else {
            self.process(router);
        }
    }

    /// Answer what is left in the buffer after the peer stopped sending,
    /// closing once no response is pending.
    fn finish_buffered(&mut self, router: &Router) {
        self.process(router);
        if self.state == State::AwaitingRequest {
            if !self.input.is_empty() {
                debug!("Peer closed with {} bytes of an incomplete request", self.input.len());
            }
            self.close();
        }
    }

    fn fill(&mut self) -> io::Result<Fill> {
        loop {
            if self.input.is_full() {
                return Ok(Fill::Full);
            }
            match self.input.read_from(&mut self.stream) {
                Ok(0) => return Ok(Fill::Eof),
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(Fill::Drained),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }

    /// Answer complete requests until one is only partially written or the
    /// buffer holds no further complete request.
    fn process(&mut self, router: &Router) {
        while self.state == State::AwaitingRequest {
            let len = match frame(self.input.filled()) {
                Frame::Complete(len) => len,
                Frame::Incomplete => {
                    let capacity = self.input.capacity();
                    if required_len(self.input.filled()).is_some_and(|required| required > capacity) {
                        self.reject(&parser::Error::RequestTooLarge(capacity));
                    }
                    return;
                }
            };

            let parsed = parse_request(&self.input.filled()[..len]);
            self.input.consume(len);

            match parsed {
                Ok(request) => {
                    let keep_alive = request.is_keep_alive();
                    let response = dispatch(router, request);
                    self.respond(&response, keep_alive);
                }
                Err(e) => self.reject(&e),
            }
        }
    }

    /// Answer a protocol error and close once it is written.
    fn reject(&mut self, err: &parser::Error) {
        debug!("Rejecting request: {err}");
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BadRequest);
        let response = HttpResponse::from_status(status).with_header("Connection", "close");
        self.respond(&response, false);
    }

    fn respond(&mut self, response: &HttpResponse, keep_alive: bool) {
        self.output = response.to_bytes();
        self.written = 0;
        self.keep_alive = keep_alive;
        self.state = State::Writing;
        self.flush();
    }

    /// Write as much pending output as the socket takes.
    fn flush(&mut self) {
        while self.written < self.output.len() {
            match self.stream.write(&self.output[self.written..]) {
                Ok(0) => {
                    debug!("Peer stopped accepting data, closing connection");
                    return self.close();
                }
                Ok(n) => self.written += n,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    debug!("Write failed, closing connection: {e}");
                    return self.close();
                }
            }
        }

        self.output.clear();
        self.written = 0;
        self.state = if self.keep_alive {
            State::AwaitingRequest
        } else {
            State::Closed
        };
    }
}

/// Route a parsed request and run its handler.
///
/// A miss answers 404. A handler error or panic answers 500 and is logged,
/// never sent to the client.
pub fn dispatch(router: &Router, request: HttpRequest) -> HttpResponse {
    let method = request.method();
    let path = request.path().to_string();

    let Some((params, handler)) = router.find(&path, method) else {
        debug!("{method} {path} -> 404");
        return HttpResponse::from_status(StatusCode::NotFound);
    };

    let response = match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(request, params))) {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            error!("Handler for {method} {path} failed: {e}");
            HttpResponse::from_status(StatusCode::InternalServerError)
        }
        Err(_) => {
            error!("Handler for {method} {path} panicked");
            HttpResponse::from_status(StatusCode::InternalServerError)
        }
    };
    debug!("{method} {path} -> {}", response.status().as_u16());
    response
}
