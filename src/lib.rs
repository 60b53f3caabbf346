//! ChhayaSLAM - Fixture-replay SLAM service
//!
//! A stand-in for a SLAM provider in integration tests and demos. It speaks
//! the provider contract (pose, point-cloud map, internal state, properties)
//! but does no sensing or mapping: maps rotate through pre-captured
//! fixtures and large payloads are served as bounded-size chunk streams.
//!
//! ## Layers
//!
//! - [`core`]: `SlamService` contract and shared types
//! - [`replay`]: fixture rotation, chunked streams, pose generation
//! - [`streaming`]: length-prefixed TCP transport (server + client)

pub mod config;
pub mod core;
pub mod error;
pub mod replay;
pub mod streaming;

// Re-export commonly used types
pub use config::Config;
pub use crate::core::service::SlamService;
pub use error::{Error, Result};
pub use replay::ReplaySlam;
