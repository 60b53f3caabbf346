//! Request and response messages.
//!
//! A client sends one [`Request`] at a time. Most requests are answered by a
//! single [`Response`]; map and internal-state requests are answered by zero
//! or more [`Response::Chunk`] frames terminated by exactly one
//! [`Response::EndOfStream`] or [`Response::Error`].
//!
//! Command maps hold untyped JSON values, which binary formats cannot
//! describe, so they travel as JSON text in every wire format.

use crate::core::types::{CommandMap, Pose2D, Properties};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Client → service
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Request {
    Name,
    Position,
    PointCloudMap { return_edited_map: bool },
    InternalState,
    Properties,
    DoCommand { command_json: String },
}

/// Service → client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Response {
    Name { name: String },
    Pose(Pose2D),
    /// One piece of a chunked transfer
    Chunk { data: Vec<u8> },
    /// Chunked transfer complete
    EndOfStream { total_bytes: u64 },
    Properties(Properties),
    CommandResult { result_json: String },
    /// Request failed; ends a chunked transfer early
    Error { message: String },
}

/// Encode a command map for [`Request::DoCommand`] / [`Response::CommandResult`]
pub fn encode_command(command: &CommandMap) -> Result<String> {
    Ok(serde_json::to_string(command)?)
}

/// Decode a command map; must be a JSON object
pub fn decode_command(json: &str) -> Result<CommandMap> {
    serde_json::from_str(json)
        .map_err(|e| Error::Protocol(format!("command must be a JSON object: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_encoding() {
        let mut command = CommandMap::new();
        command.insert("speed".to_string(), serde_json::json!(1.5));
        command.insert("tags".to_string(), serde_json::json!(["a", "b"]));

        let json = encode_command(&command).unwrap();
        assert_eq!(decode_command(&json).unwrap(), command);
    }

    #[test]
    fn test_command_must_be_object() {
        assert!(matches!(decode_command("[1, 2]"), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&Request::PointCloudMap {
            return_edited_map: true,
        })
        .unwrap();
        assert_eq!(json, r#"{"PointCloudMap":{"return_edited_map":true}}"#);

        let json = serde_json::to_string(&Response::EndOfStream { total_bytes: 3 }).unwrap();
        assert_eq!(json, r#"{"EndOfStream":{"total_bytes":3}}"#);
    }
}
