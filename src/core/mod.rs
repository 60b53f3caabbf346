//! Core abstractions for the SLAM service contract.
//!
//! - [`service::SlamService`]: Trait the transport serves
//! - [`types`]: Poses, properties, and command maps

pub mod service;
pub mod types;
