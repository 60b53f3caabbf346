//! Chunked transfer of large payloads
//!
//! Point clouds and internal state blobs can be many megabytes, so they are
//! never handed to a caller in one piece. [`ChunkStream`] wraps a payload and
//! yields it as a sequence of bounded-size chunks that the caller pulls one
//! at a time.
//!
//! # Stream Lifecycle
//!
//! ```text
//!            next_chunk() -> Ok(Some(chunk))
//!              ┌──────┐
//!              ▼      │
//!         ┌─────────────┐  reader at EOF  ┌──────────┐
//!   new ─▶│    Open     │────────────────▶│ Finished │── Ok(None) forever
//!         └─────────────┘                 └──────────┘
//!                │ read error
//!                ▼
//!         ┌─────────────┐
//!         │   Faulted   │── Err(TransferFault) forever
//!         └─────────────┘
//! ```
//!
//! # Guarantees
//!
//! - Chunks are contiguous and in order; concatenating them reproduces the payload.
//! - Every chunk except the last is exactly `chunk_size` bytes, so a payload of
//!   length `L` takes `ceil(L / chunk_size)` pulls before end-of-stream.
//! - An empty payload signals end-of-stream on the first pull.
//! - A failed pull never advances [`delivered`](ChunkStream::delivered) past
//!   the bytes returned by earlier pulls; bytes read during the failed pull are
//!   discarded along with the stream.
//!
//! A stream is single-consumer: it is owned by whoever opened it and is meant
//! to be drained sequentially. Dropping it cancels the transfer.

use crate::error::{Error, Result};
use std::io::{Cursor, ErrorKind, Read};
use std::iter::FusedIterator;
use std::sync::Arc;

/// Default maximum chunk size (1 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Reader over a shared, immutable in-memory payload
pub type PayloadReader = Cursor<Arc<[u8]>>;

/// Position of a stream in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// More chunks may follow
    Open,
    /// End-of-stream reached
    Finished,
    /// A pull failed; the stream is unusable
    Faulted,
}

/// Pull-based chunk stream over a byte source
pub struct ChunkStream<R> {
    reader: R,
    /// Reusable chunk buffer, `chunk_size` bytes long
    buffer: Vec<u8>,
    /// Bytes handed out so far
    delivered: u64,
    state: StreamState,
}

impl ChunkStream<PayloadReader> {
    /// Open a stream over an in-memory payload
    pub fn from_payload(payload: Arc<[u8]>, chunk_size: usize) -> Self {
        Self::new(Cursor::new(payload), chunk_size)
    }
}

impl<R: Read> ChunkStream<R> {
    /// Open a stream over any reader.
    ///
    /// A `chunk_size` of 0 is treated as 1.
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buffer: vec![0u8; chunk_size.max(1)],
            delivered: 0,
            state: StreamState::Open,
        }
    }

    /// Pull the next chunk.
    ///
    /// Returns `Ok(Some(chunk))` while data remains, `Ok(None)` at
    /// end-of-stream, and `Err(Error::TransferFault)` if the underlying
    /// reader fails. The returned slice is valid until the next pull.
    pub fn next_chunk(&mut self) -> Result<Option<&[u8]>> {
        match self.state {
            StreamState::Finished => return Ok(None),
            StreamState::Faulted => {
                return Err(Error::TransferFault(format!(
                    "stream already faulted after {} bytes",
                    self.delivered
                )));
            }
            StreamState::Open => {}
        }

        let mut filled = 0;
        let mut at_eof = false;
        while filled < self.buffer.len() {
            match self.reader.read(&mut self.buffer[filled..]) {
                Ok(0) => {
                    at_eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    self.state = StreamState::Faulted;
                    log::warn!(
                        "Chunk stream faulted after {} bytes: {}",
                        self.delivered,
                        e
                    );
                    return Err(Error::TransferFault(format!(
                        "read failed after {} bytes: {}",
                        self.delivered, e
                    )));
                }
            }
        }

        if at_eof {
            self.state = StreamState::Finished;
            log::debug!(
                "Chunk stream finished: {} bytes",
                self.delivered + filled as u64
            );
        }

        if filled == 0 {
            return Ok(None);
        }

        self.delivered += filled as u64;
        Ok(Some(&self.buffer[..filled]))
    }

    /// Bytes successfully returned so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Current lifecycle state
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Maximum bytes per chunk
    pub fn chunk_size(&self) -> usize {
        self.buffer.len()
    }
}

/// Owned-chunk iteration. Yields a fault once, then ends.
impl<R: Read> Iterator for ChunkStream<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == StreamState::Faulted {
            return None;
        }
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk.to_vec())),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<R: Read> FusedIterator for ChunkStream<R> {}
