//! TCP transport for the SLAM service

pub mod client;
pub mod messages;
pub mod server;
pub mod wire;

pub use client::SlamClient;
pub use messages::{Request, Response};
pub use server::SlamServer;
pub use wire::{Serializer, WireFormat};
