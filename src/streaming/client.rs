//! Blocking TCP client for a [`SlamServer`](super::SlamServer)
//!
//! # Example
//!
//! ```no_run
//! use chhaya_slam::streaming::{SlamClient, WireFormat};
//!
//! let mut client = SlamClient::connect("127.0.0.1:5560", WireFormat::Json)?;
//! let pcd = client.point_cloud_map(false)?;
//! println!("map: {} bytes", pcd.len());
//! # Ok::<(), chhaya_slam::Error>(())
//! ```

use crate::core::types::{CommandMap, Pose2D, Properties};
use crate::error::{Error, Result};
use crate::streaming::messages::{Request, Response, decode_command, encode_command};
use crate::streaming::wire::{Serializer, WireFormat, read_frame};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Connection to a SLAM server
pub struct SlamClient {
    stream: TcpStream,
    serializer: Serializer,
    read_buffer: Vec<u8>,
}

impl SlamClient {
    /// Connect to a server speaking `format`
    pub fn connect<A: ToSocketAddrs>(addr: A, format: WireFormat) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            serializer: Serializer::new(format),
            read_buffer: Vec::new(),
        })
    }

    /// Set read timeout; `None` blocks indefinitely
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.stream.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Resource name of the remote service
    pub fn name(&mut self) -> Result<String> {
        match self.call(&Request::Name)? {
            Response::Name { name } => Ok(name),
            other => Err(unexpected(&other)),
        }
    }

    pub fn position(&mut self) -> Result<Pose2D> {
        match self.call(&Request::Position)? {
            Response::Pose(pose) => Ok(pose),
            other => Err(unexpected(&other)),
        }
    }

    pub fn properties(&mut self) -> Result<Properties> {
        match self.call(&Request::Properties)? {
            Response::Properties(properties) => Ok(properties),
            other => Err(unexpected(&other)),
        }
    }

    pub fn do_command(&mut self, command: &CommandMap) -> Result<CommandMap> {
        let request = Request::DoCommand {
            command_json: encode_command(command)?,
        };
        match self.call(&request)? {
            Response::CommandResult { result_json } => decode_command(&result_json),
            other => Err(unexpected(&other)),
        }
    }

    /// Download the current point-cloud map
    pub fn point_cloud_map(&mut self, return_edited_map: bool) -> Result<Vec<u8>> {
        Ok(self.point_cloud_map_chunks(return_edited_map)?.concat())
    }

    /// Download the current point-cloud map, keeping chunk boundaries
    pub fn point_cloud_map_chunks(&mut self, return_edited_map: bool) -> Result<Vec<Vec<u8>>> {
        self.send(&Request::PointCloudMap { return_edited_map })?;
        self.receive_chunks()
    }

    /// Download the internal state blob
    pub fn internal_state(&mut self) -> Result<Vec<u8>> {
        self.send(&Request::InternalState)?;
        Ok(self.receive_chunks()?.concat())
    }

    fn call(&mut self, request: &Request) -> Result<Response> {
        self.send(request)?;
        match self.receive()? {
            Response::Error { message } => Err(Error::Remote(message)),
            response => Ok(response),
        }
    }

    /// Collect `Chunk` frames until `EndOfStream`
    fn receive_chunks(&mut self) -> Result<Vec<Vec<u8>>> {
        let mut chunks = Vec::new();
        let mut received = 0u64;
        loop {
            match self.receive()? {
                Response::Chunk { data } => {
                    received += data.len() as u64;
                    chunks.push(data);
                }
                Response::EndOfStream { total_bytes } => {
                    if total_bytes != received {
                        return Err(Error::Protocol(format!(
                            "stream ended after {} bytes, server reported {}",
                            received, total_bytes
                        )));
                    }
                    return Ok(chunks);
                }
                Response::Error { message } => return Err(Error::Remote(message)),
                other => return Err(unexpected(&other)),
            }
        }
    }

    fn send(&mut self, request: &Request) -> Result<()> {
        self.serializer.write_message(&mut self.stream, request)
    }

    fn receive(&mut self) -> Result<Response> {
        if !read_frame(&mut self.stream, &mut self.read_buffer)? {
            return Err(Error::Other("timed out waiting for response".to_string()));
        }
        self.serializer.deserialize(&self.read_buffer)
    }
}

fn unexpected(response: &Response) -> Error {
    let kind = match response {
        Response::Name { .. } => "Name",
        Response::Pose(_) => "Pose",
        Response::Chunk { .. } => "Chunk",
        Response::EndOfStream { .. } => "EndOfStream",
        Response::Properties(_) => "Properties",
        Response::CommandResult { .. } => "CommandResult",
        Response::Error { .. } => "Error",
    };
    Error::Protocol(format!("unexpected {} response", kind))
}
