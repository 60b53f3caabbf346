//! Core data types exchanged with SLAM clients.

use serde::{Deserialize, Serialize};

/// Free-form command payload for `do_command`
pub type CommandMap = serde_json::Map<String, serde_json::Value>;

/// Planar pose in the map frame.
///
/// Position is in millimetres, `theta` is yaw in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }
}

/// Whether the service claims to build a new map or localize in an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingMode {
    /// Building a new map
    #[default]
    NewMap,
    /// Localizing against an existing map, no map updates
    LocalizationOnly,
}

/// Static service properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    /// Whether mapping runs in the cloud
    pub cloud_slam: bool,
    pub mapping_mode: MappingMode,
    /// File extension of the internal state blob (e.g. `.pbstream`)
    pub internal_state_file_type: String,
}
