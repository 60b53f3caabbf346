//! Wire format and framing
//!
//! # TCP Protocol
//!
//! Every message travels as one length-prefixed frame:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (4 bytes) │ Payload (variable)       │
//! │ Big-endian u32   │ JSON or Postcard binary  │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! - **Maximum chunk**: 1 MiB of payload data per `Chunk` response
//! - **Maximum frame**: sized for a maximum chunk in the more verbose JSON
//!   encoding (up to 4 bytes per data byte) plus the message envelope.
//!   Oversized frames close the connection.
//!
//! ## Wire Formats
//!
//! - **JSON** (default): readable, easy to poke at with `nc` + `jq`
//! - **Postcard**: compact binary, one byte per chunk byte

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{self, ErrorKind, Read, Write};

/// Largest chunk a stream may be configured to produce
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// Room for the message envelope around chunk data
const FRAME_ENVELOPE: usize = 4096;

/// Largest frame accepted on the wire
pub const MAX_FRAME_SIZE: usize = 4 * MAX_CHUNK_SIZE + FRAME_ENVELOPE;

/// Supported wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Binary format using postcard - fast and compact
    Postcard,
    /// JSON format - human-readable for debugging
    #[default]
    Json,
}

/// Encodes and decodes framed messages in one wire format
#[derive(Debug, Clone)]
pub struct Serializer {
    format: WireFormat,
}

impl Serializer {
    /// Create a new serializer for the given format
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }

    /// Wire format in use
    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// Serialize a message to bytes
    pub fn serialize<T: Serialize>(&self, msg: &T) -> Result<Vec<u8>> {
        match self.format {
            WireFormat::Postcard => {
                postcard::to_allocvec(msg).map_err(|e| Error::Serialization(e.to_string()))
            }
            WireFormat::Json => {
                serde_json::to_vec(msg).map_err(|e| Error::Serialization(e.to_string()))
            }
        }
    }

    /// Deserialize bytes to a message
    pub fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self.format {
            WireFormat::Postcard => {
                postcard::from_bytes(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
            WireFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
        }
    }

    /// Serialize `msg` and write it as one frame
    pub fn write_message<W: Write, T: Serialize>(&self, writer: &mut W, msg: &T) -> Result<()> {
        let payload = self.serialize(msg)?;
        write_frame(writer, &payload)
    }
}

/// Write one length-prefixed frame
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    if payload.len() > MAX_FRAME_SIZE {
        return Err(Error::Protocol(format!(
            "frame too large: {} bytes (max {})",
            payload.len(),
            MAX_FRAME_SIZE
        )));
    }

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// Read one length-prefixed frame into `buf`.
///
/// Returns `Ok(false)` if a read timeout expired before any byte of a frame
/// arrived, so callers with a read timeout can poll shutdown flags between
/// frames. Once a frame has started, timeouts are waited out until the
/// frame is complete.
pub fn read_frame<R: Read>(reader: &mut R, buf: &mut Vec<u8>) -> Result<bool> {
    let mut len_buf = [0u8; 4];
    if !fill(reader, &mut len_buf, true)? {
        return Ok(false);
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(Error::Protocol(format!(
            "frame too large: {} bytes (max {})",
            len, MAX_FRAME_SIZE
        )));
    }

    // Reuse buffer - resize only if needed
    buf.clear();
    buf.resize(len, 0);
    fill(reader, buf, false)?;
    Ok(true)
}

/// Fill `buf` completely.
///
/// With `idle_ok`, a timeout before the first byte returns `Ok(false)`;
/// any later timeout is resumed so no consumed bytes are lost.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8], idle_ok: bool) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Err(Error::Io(io::Error::from(ErrorKind::UnexpectedEof))),
            Ok(n) => filled += n,
            Err(e) if is_timeout(&e) && idle_ok && filled == 0 => return Ok(false),
            Err(e) if is_timeout(&e) || e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(true)
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// Whether an error means the peer closed the connection
pub fn is_disconnect(error: &Error) -> bool {
    matches!(
        error,
        Error::Io(e) if matches!(
            e.kind(),
            ErrorKind::UnexpectedEof
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::BrokenPipe
        )
    )
}
