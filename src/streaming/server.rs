//! TCP server exposing a [`SlamService`]
//!
//! # Connection Lifecycle
//!
//! ```text
//! 1. Client connects to the bind address
//! 2. Server spawns a `slam-conn` thread for this client
//! 3. Thread answers requests one at a time until disconnect or shutdown
//! ```
//!
//! Any number of clients may be connected; they share one service instance.
//! A chunked transfer is pulled only as fast as the client consumes frames.
//! If the client disconnects mid-transfer the stream is dropped and nothing
//! else needs cleaning up.
//!
//! # Safety Features
//!
//! - **Read timeout**: 500ms timeout allows periodic shutdown flag checks
//! - **Frame limit**: oversized frames close the connection

use crate::core::service::SlamService;
use crate::error::{Error, Result};
use crate::replay::chunked::ChunkStream;
use crate::streaming::messages::{Request, Response, decode_command, encode_command};
use crate::streaming::wire::{Serializer, WireFormat, is_disconnect, read_frame};
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Poll interval of the accept loop
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// Read timeout on client sockets
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Initial capacity for request read buffer (typical request size)
const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Accepts clients and serves SLAM requests
pub struct SlamServer {
    listener: TcpListener,
    service: Arc<dyn SlamService>,
    format: WireFormat,
    running: Arc<AtomicBool>,
}

impl SlamServer {
    /// Bind the listening socket.
    ///
    /// The server runs until `running` is cleared.
    pub fn bind(
        bind_address: &str,
        service: Arc<dyn SlamService>,
        format: WireFormat,
        running: Arc<AtomicBool>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(bind_address)
            .map_err(|e| Error::Other(format!("Failed to bind to {}: {}", bind_address, e)))?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            listener,
            service,
            format,
            running,
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept loop; returns once the running flag is cleared
    pub fn run(&self) -> Result<()> {
        log::info!(
            "SLAM server listening on {} ({:?})",
            self.local_addr()?,
            self.format
        );

        while self.running.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, addr)) => self.spawn_connection(stream, addr),
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    log::error!("Accept error: {}", e);
                }
            }
        }

        log::info!("SLAM server stopped");
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr) {
        // Accepted sockets may inherit nonblocking mode
        if let Err(e) = stream.set_nonblocking(false) {
            log::error!("Failed to set socket to blocking mode for {}: {}", addr, e);
            return;
        }

        log::info!("Client connected: {}", addr);
        let mut handler = ConnectionHandler::new(
            Arc::clone(&self.service),
            Serializer::new(self.format),
            Arc::clone(&self.running),
        );

        let spawned = thread::Builder::new()
            .name("slam-conn".to_string())
            .spawn(move || {
                if let Err(e) = handler.run(stream) {
                    log::error!("Connection {} error: {}", addr, e);
                }
                log::info!("Client disconnected: {}", addr);
            });
        if let Err(e) = spawned {
            log::error!("Failed to spawn connection thread: {}", e);
        }
    }
}

/// Serves requests on one client connection
struct ConnectionHandler {
    service: Arc<dyn SlamService>,
    serializer: Serializer,
    running: Arc<AtomicBool>,
    /// Reusable buffer for request payloads
    read_buffer: Vec<u8>,
}

impl ConnectionHandler {
    fn new(
        service: Arc<dyn SlamService>,
        serializer: Serializer,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            service,
            serializer,
            running,
            read_buffer: Vec::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    fn run(&mut self, mut stream: TcpStream) -> Result<()> {
        if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
            log::warn!("Failed to set read timeout: {}", e);
        }

        let result = self.serve(&mut stream);
        let _ = stream.shutdown(std::net::Shutdown::Both);

        match result {
            Err(ref e) if is_disconnect(e) => Ok(()),
            other => other,
        }
    }

    fn serve(&mut self, stream: &mut TcpStream) -> Result<()> {
        while self.running.load(Ordering::Relaxed) {
            if !read_frame(stream, &mut self.read_buffer)? {
                continue;
            }

            let request: Request = match self.serializer.deserialize(&self.read_buffer) {
                Ok(request) => request,
                Err(e) => {
                    log::warn!("Discarding malformed request: {}", e);
                    self.send(
                        stream,
                        &Response::Error {
                            message: e.to_string(),
                        },
                    )?;
                    continue;
                }
            };

            log::debug!("Request: {:?}", request);
            self.dispatch(stream, request)?;
        }
        Ok(())
    }

    fn dispatch<W: Write>(&mut self, stream: &mut W, request: Request) -> Result<()> {
        let response = match request {
            Request::PointCloudMap { return_edited_map } => {
                let chunks = self.service.point_cloud_map(return_edited_map);
                return self.send_chunks(stream, chunks);
            }
            Request::InternalState => {
                let chunks = self.service.internal_state();
                return self.send_chunks(stream, chunks);
            }
            Request::Name => Ok(Response::Name {
                name: self.service.name().to_string(),
            }),
            Request::Position => self.service.position().map(Response::Pose),
            Request::Properties => self.service.properties().map(Response::Properties),
            Request::DoCommand { command_json } => decode_command(&command_json)
                .and_then(|command| self.service.do_command(command))
                .and_then(|result| encode_command(&result))
                .map(|result_json| Response::CommandResult { result_json }),
        };

        let response = response.unwrap_or_else(|e| Response::Error {
            message: e.to_string(),
        });
        self.send(stream, &response)
    }

    /// Pull the stream to completion, one frame per chunk.
    ///
    /// The transfer always ends with exactly one `EndOfStream` or `Error` frame.
    fn send_chunks<W: Write, R: Read>(
        &self,
        stream: &mut W,
        chunks: Result<ChunkStream<R>>,
    ) -> Result<()> {
        let mut chunks = match chunks {
            Ok(chunks) => chunks,
            Err(e) => {
                return self.send(
                    stream,
                    &Response::Error {
                        message: e.to_string(),
                    },
                );
            }
        };

        loop {
            if !self.running.load(Ordering::Relaxed) {
                return self.send(
                    stream,
                    &Response::Error {
                        message: "service shutting down".to_string(),
                    },
                );
            }

            match chunks.next_chunk() {
                Ok(Some(data)) => {
                    let frame = Response::Chunk {
                        data: data.to_vec(),
                    };
                    self.send(stream, &frame)?;
                }
                Ok(None) => {
                    log::debug!("Stream complete: {} bytes", chunks.delivered());
                    return self.send(
                        stream,
                        &Response::EndOfStream {
                            total_bytes: chunks.delivered(),
                        },
                    );
                }
                Err(e) => {
                    log::error!("Stream aborted: {}", e);
                    return self.send(
                        stream,
                        &Response::Error {
                            message: e.to_string(),
                        },
                    );
                }
            }
        }
    }

    fn send<W: Write>(&self, stream: &mut W, response: &Response) -> Result<()> {
        self.serializer.write_message(stream, response)
    }
}
