//! SlamService trait definition

use crate::core::types::{CommandMap, Pose2D, Properties};
use crate::error::Result;
use crate::replay::chunked::{ChunkStream, PayloadReader};

/// External contract of a SLAM provider.
///
/// Streams returned by [`point_cloud_map`](SlamService::point_cloud_map) and
/// [`internal_state`](SlamService::internal_state) are owned by the caller and
/// drained sequentially; dropping one mid-way cancels the transfer.
pub trait SlamService: Send + Sync {
    /// Resource name of this service instance
    fn name(&self) -> &str;

    /// Current pose estimate
    fn position(&self) -> Result<Pose2D>;

    /// Current point-cloud map (PCD).
    ///
    /// `return_edited_map` is accepted for compatibility and has no effect.
    fn point_cloud_map(&self, return_edited_map: bool) -> Result<ChunkStream<PayloadReader>>;

    /// Serialized internal mapping state
    fn internal_state(&self) -> Result<ChunkStream<PayloadReader>>;

    /// Static properties
    fn properties(&self) -> Result<Properties>;

    /// Model-specific extension point
    fn do_command(&self, command: CommandMap) -> Result<CommandMap>;
}
