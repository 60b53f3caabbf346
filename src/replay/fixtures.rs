//! Fixture set loading
//!
//! Fixtures are read once at startup into shared immutable buffers. A missing
//! or unreadable file is fatal: the service never starts with a partial set.

use crate::config::FixturesConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Point-cloud snapshots and the internal state blob served by the replay service
#[derive(Debug, Clone)]
pub struct FixtureSet {
    point_clouds: Arc<[Arc<[u8]>]>,
    internal_state: Arc<[u8]>,
}

impl FixtureSet {
    /// Build from in-memory buffers. At least one point cloud is required.
    pub fn new<I, P>(point_clouds: I, internal_state: impl Into<Arc<[u8]>>) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Arc<[u8]>>,
    {
        let point_clouds: Arc<[Arc<[u8]>]> = point_clouds.into_iter().map(Into::into).collect();
        if point_clouds.is_empty() {
            return Err(Error::Config(
                "fixture set needs at least one point cloud".to_string(),
            ));
        }
        Ok(Self {
            point_clouds,
            internal_state: internal_state.into(),
        })
    }

    /// Read every configured fixture file
    pub fn load(config: &FixturesConfig) -> Result<Self> {
        let point_clouds = config
            .point_clouds
            .iter()
            .map(|path| read_fixture(path))
            .collect::<Result<Vec<_>>>()?;
        let internal_state = read_fixture(&config.internal_state)?;

        let set = Self::new(point_clouds, internal_state)?;
        log::info!(
            "Loaded {} point-cloud fixtures ({} bytes) and internal state ({} bytes)",
            set.point_clouds.len(),
            set.point_clouds.iter().map(|pc| pc.len()).sum::<usize>(),
            set.internal_state.len()
        );
        Ok(set)
    }

    /// Point clouds in rotation order
    pub fn point_clouds(&self) -> &Arc<[Arc<[u8]>]> {
        &self.point_clouds
    }

    /// Internal state blob
    pub fn internal_state(&self) -> &Arc<[u8]> {
        &self.internal_state
    }
}

fn read_fixture(path: &Path) -> Result<Arc<[u8]>> {
    let bytes = fs::read(path).map_err(|source| Error::FixtureLoad {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Read fixture {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes.into())
}
