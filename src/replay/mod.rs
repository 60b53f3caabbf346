//! Fixture-replay SLAM service
//!
//! [`ReplaySlam`] behaves like a SLAM provider without doing any sensing or
//! mapping. It replays pre-captured data:
//!
//! | Call | Served from |
//! |------|-------------|
//! | `position` | [`pose_sim`]: uniform random pose |
//! | `point_cloud_map` | [`rotator`]: fixture picked by call count, streamed via [`chunked`] |
//! | `internal_state` | fixed blob, streamed via [`chunked`] |
//! | `properties` | fixed at construction |
//! | `do_command` | no-op |
//!
//! # Module Structure
//!
//! - [`chunked`]: Bounded-size pull streams over payloads
//! - [`rotator`]: Call-count based fixture rotation
//! - [`pose_sim`]: Random pose generation
//! - [`fixtures`]: Loading the fixture set from disk

pub mod chunked;
pub mod fixtures;
pub mod pose_sim;
pub mod rotator;

use crate::config::Config;
use crate::core::service::SlamService;
use crate::core::types::{CommandMap, MappingMode, Pose2D, Properties};
use crate::error::Result;

use chunked::{ChunkStream, PayloadReader};
use fixtures::FixtureSet;
use pose_sim::PoseGenerator;
use rotator::MapRotator;

use std::sync::Arc;

/// Model identifier under which the service registers with a host runtime
pub const MODEL: &str = "cjnj193:fake-slam:fake";

/// File type reported for the internal state blob
pub const INTERNAL_STATE_FILE_TYPE: &str = ".pbstream";

/// SLAM service that replays fixtures
pub struct ReplaySlam {
    name: String,
    mode: MappingMode,
    chunk_size: usize,
    rotator: MapRotator,
    internal_state: Arc<[u8]>,
    poses: PoseGenerator,
}

impl ReplaySlam {
    /// Wire a service from validated configuration and a loaded fixture set
    pub fn new(config: &Config, fixtures: FixtureSet) -> Self {
        let threshold = config.service.resolved_threshold();
        let mode = config.service.mapping_mode();

        log::info!(
            "Replay SLAM '{}' ({}): {} fixtures, rotating every {} calls, mode {:?}",
            config.service.name,
            MODEL,
            fixtures.point_clouds().len(),
            threshold,
            mode
        );

        Self {
            name: config.service.name.clone(),
            mode,
            chunk_size: config.streaming.chunk_size_bytes,
            rotator: MapRotator::new(Arc::clone(fixtures.point_clouds()), threshold),
            internal_state: Arc::clone(fixtures.internal_state()),
            poses: PoseGenerator::new(config.pose.random_seed),
        }
    }

    /// Map requests served so far
    pub fn map_requests(&self) -> u64 {
        self.rotator.counter()
    }

    /// Fixture index the next map request will receive
    pub fn next_map_index(&self) -> usize {
        self.rotator.index_for(self.rotator.counter() + 1)
    }
}

impl SlamService for ReplaySlam {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Result<Pose2D> {
        Ok(self.poses.current_pose())
    }

    fn point_cloud_map(&self, return_edited_map: bool) -> Result<ChunkStream<PayloadReader>> {
        let selection = self.rotator.select();
        log::debug!(
            "point_cloud_map(return_edited_map={}): call #{} -> fixture {} ({} bytes)",
            return_edited_map,
            selection.counter,
            selection.index,
            selection.payload.len()
        );
        Ok(ChunkStream::from_payload(selection.payload, self.chunk_size))
    }

    fn internal_state(&self) -> Result<ChunkStream<PayloadReader>> {
        Ok(ChunkStream::from_payload(
            Arc::clone(&self.internal_state),
            self.chunk_size,
        ))
    }

    fn properties(&self) -> Result<Properties> {
        Ok(Properties {
            cloud_slam: false,
            mapping_mode: self.mode,
            internal_state_file_type: INTERNAL_STATE_FILE_TYPE.to_string(),
        })
    }

    fn do_command(&self, command: CommandMap) -> Result<CommandMap> {
        log::debug!("do_command ignored: {} keys", command.len());
        Ok(CommandMap::new())
    }
}
