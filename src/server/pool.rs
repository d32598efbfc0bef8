//! Fixed-size pool of reusable connection buffers.

use std::io::{self, Read};

use crossbeam_queue::ArrayQueue;
use log::warn;

use crate::server::error::Error;

/// A fixed-capacity byte buffer handed out by [`BufferPool`].
///
/// Bytes `[0, len)` are filled; the rest is spare room for the next read.
/// The allocation is never resized.
pub struct Buffer {
    bytes: Box<[u8]>,
    len: usize,
}

impl Buffer {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.bytes.len()
    }

    /// The filled part of the buffer.
    pub fn filled(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Read once from `source` into the spare room.
    ///
    /// Returns the number of bytes read; `Ok(0)` means end of stream (or a
    /// full buffer, which callers check first).
    pub fn read_from<R: Read>(&mut self, source: &mut R) -> io::Result<usize> {
        let n = source.read(&mut self.bytes[self.len..])?;
        self.len += n;
        Ok(n)
    }

    /// Drop the first `n` filled bytes, moving the remainder to the front.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.len);
        self.bytes.copy_within(n..self.len, 0);
        self.len -= n;
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

/// Preallocated buffers shared by every worker.
///
/// `acquire` never waits: when every buffer is out it fails and the caller
/// drops the connection that needed one.
pub struct BufferPool {
    free: ArrayQueue<Buffer>,
    buffer_capacity: usize,
}

impl BufferPool {
    /// Allocate `count` buffers of `buffer_capacity` bytes each.
    pub fn new(count: usize, buffer_capacity: usize) -> Self {
        let free = ArrayQueue::new(count.max(1));
        for _ in 0..count {
            // Cannot fail: the queue was sized for `count` items
            let _ = free.push(Buffer::with_capacity(buffer_capacity));
        }
        Self {
            free,
            buffer_capacity,
        }
    }

    /// Take a free buffer.
    pub fn acquire(&self) -> Result<Buffer, Error> {
        self.free.pop().ok_or_else(|| {
            warn!("Buffer pool exhausted");
            Error::PoolExhausted {
                capacity: self.free.capacity(),
            }
        })
    }

    /// Clear `buffer` and return it to the pool.
    pub fn release(&self, mut buffer: Buffer) {
        buffer.clear();
        if self.free.push(buffer).is_err() {
            warn!("Released a buffer into a full pool, dropping it");
        }
    }

    /// Number of buffers currently free.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }
}
