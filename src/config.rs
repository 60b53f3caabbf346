//! Configuration for ChhayaSLAM
//!
//! Loads the daemon configuration from a TOML file. Every section has
//! defaults, so an empty file yields a runnable service as long as the
//! fixtures sit in a `fixtures/` directory next to that file.
//!
//! ```toml
//! [service]
//! name = "fake-slam"
//! calls_till_next_map = 5
//! is_localizing = false
//!
//! [fixtures]
//! point_clouds = ["fixtures/pointcloud_2.pcd", "fixtures/pointcloud_3.pcd", "fixtures/pointcloud_4.pcd"]
//! internal_state = "fixtures/internal_state.pbstream"
//!
//! [streaming]
//! chunk_size_bytes = 1048576
//!
//! [pose]
//! random_seed = 0
//!
//! [network]
//! bind_address = "0.0.0.0:5560"
//! wire_format = "json"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Relative fixture paths, including the defaults, are resolved against the
//! directory of the configuration file. An empty `/etc/chhaya.toml` therefore
//! reads `/etc/fixtures/pointcloud_2.pcd` and friends.

use crate::core::types::MappingMode;
use crate::error::{Error, Result};
use crate::replay::chunked::DEFAULT_CHUNK_SIZE;
use crate::streaming::wire::{MAX_CHUNK_SIZE, WireFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Rotation threshold used when `calls_till_next_map` is 0
pub const DEFAULT_CALLS_TILL_NEXT_MAP: u64 = 5;

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub fixtures: FixturesConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
    #[serde(default)]
    pub pose: PoseConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Service attributes, as exposed to the host runtime
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Resource name reported by the service
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Map requests served before rotating to the next fixture.
    ///
    /// 0 resolves to [`DEFAULT_CALLS_TILL_NEXT_MAP`]; negative values are rejected.
    #[serde(default)]
    pub calls_till_next_map: i64,

    /// Report `LocalizationOnly` instead of `NewMap`
    #[serde(default)]
    pub is_localizing: bool,
}

fn default_service_name() -> String {
    "fake-slam".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            calls_till_next_map: 0,
            is_localizing: false,
        }
    }
}

impl ServiceConfig {
    /// Parse service attributes from a JSON attribute object.
    ///
    /// Unknown keys are ignored; missing keys take their defaults.
    pub fn from_attributes(attributes: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(attributes.clone())
            .map_err(|e| Error::Config(format!("invalid service attributes: {}", e)))
    }

    /// Validate the attributes found at `path` in the host configuration.
    ///
    /// Returns the implicit dependencies of the service, which is always empty.
    pub fn validate(&self, path: &str) -> Result<Vec<String>> {
        if self.calls_till_next_map < 0 {
            return Err(Error::Config(format!(
                "{}.calls_till_next_map must be >= 0, got {}",
                path, self.calls_till_next_map
            )));
        }
        if self.name.trim().is_empty() {
            return Err(Error::Config(format!("{}.name must not be empty", path)));
        }
        Ok(Vec::new())
    }

    /// Rotation threshold with the zero default applied. Always >= 1.
    pub fn resolved_threshold(&self) -> u64 {
        u64::try_from(self.calls_till_next_map)
            .ok()
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_CALLS_TILL_NEXT_MAP)
    }

    /// Mapping mode fixed for the lifetime of the service
    pub fn mapping_mode(&self) -> MappingMode {
        if self.is_localizing {
            MappingMode::LocalizationOnly
        } else {
            MappingMode::NewMap
        }
    }
}

/// Packaged fixture files
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FixturesConfig {
    /// Point-cloud snapshots, served in rotation order
    #[serde(default = "default_point_clouds")]
    pub point_clouds: Vec<PathBuf>,

    /// Serialized internal state blob
    #[serde(default = "default_internal_state")]
    pub internal_state: PathBuf,
}

fn default_point_clouds() -> Vec<PathBuf> {
    ["pointcloud_2.pcd", "pointcloud_3.pcd", "pointcloud_4.pcd"]
        .iter()
        .map(|name| Path::new("fixtures").join(name))
        .collect()
}

fn default_internal_state() -> PathBuf {
    Path::new("fixtures").join("internal_state.pbstream")
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self {
            point_clouds: default_point_clouds(),
            internal_state: default_internal_state(),
        }
    }
}

impl FixturesConfig {
    /// Make relative fixture paths relative to `base` instead of the working directory
    pub fn resolve_relative_to(&mut self, base: &Path) {
        for path in self.point_clouds.iter_mut() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        if self.internal_state.is_relative() {
            self.internal_state = base.join(&self.internal_state);
        }
    }
}

/// Chunked transfer settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    /// Maximum bytes per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: default_chunk_size(),
        }
    }
}

/// Pose generator settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PoseConfig {
    /// RNG seed; 0 draws from entropy on every start
    #[serde(default)]
    pub random_seed: u64,
}

/// TCP transport settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// TCP bind address
    ///
    /// Examples:
    /// - `0.0.0.0:5560` - All interfaces
    /// - `127.0.0.1:5560` - Localhost only
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Frame payload encoding
    #[serde(default)]
    pub wire_format: WireFormat,
}

fn default_bind_address() -> String {
    "0.0.0.0:5560".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            wire_format: WireFormat::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    ///
    /// # Example
    /// ```no_run
    /// use chhaya_slam::config::Config;
    ///
    /// let config = Config::load("/etc/chhaya.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let mut config = Self::from_toml_str(&contents)?;

        let base = path.parent().unwrap_or(Path::new("."));
        config.fixtures.resolve_relative_to(base);
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        self.service.validate("service")?;

        if self.fixtures.point_clouds.is_empty() {
            return Err(Error::Config(
                "fixtures.point_clouds must list at least one file".to_string(),
            ));
        }

        let chunk = self.streaming.chunk_size_bytes;
        if chunk == 0 || chunk > MAX_CHUNK_SIZE {
            return Err(Error::Config(format!(
                "streaming.chunk_size_bytes must be in 1..={}, got {}",
                MAX_CHUNK_SIZE, chunk
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.service.name, "fake-slam");
        assert_eq!(config.service.resolved_threshold(), 5);
        assert_eq!(config.service.mapping_mode(), MappingMode::NewMap);
        assert_eq!(config.fixtures.point_clouds.len(), 3);
        assert_eq!(config.streaming.chunk_size_bytes, 1024 * 1024);
        assert_eq!(config.network.bind_address, "0.0.0.0:5560");
        assert_eq!(config.network.wire_format, WireFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[service]
name = "slam-under-test"
calls_till_next_map = 2
is_localizing = true

[fixtures]
point_clouds = ["a.pcd", "/abs/b.pcd"]
internal_state = "state.pbstream"

[streaming]
chunk_size_bytes = 4096

[pose]
random_seed = 7

[network]
bind_address = "127.0.0.1:0"
wire_format = "postcard"

[logging]
level = "debug"
"#;

        let config = Config::from_toml_str(toml_content).unwrap();
        assert_eq!(config.service.name, "slam-under-test");
        assert_eq!(config.service.resolved_threshold(), 2);
        assert_eq!(config.service.mapping_mode(), MappingMode::LocalizationOnly);
        assert_eq!(config.streaming.chunk_size_bytes, 4096);
        assert_eq!(config.pose.random_seed, 7);
        assert_eq!(config.network.wire_format, WireFormat::Postcard);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_zero_threshold_resolves_to_default() {
        let service = ServiceConfig {
            calls_till_next_map: 0,
            ..Default::default()
        };
        assert!(service.validate("services.0").unwrap().is_empty());
        assert_eq!(service.resolved_threshold(), DEFAULT_CALLS_TILL_NEXT_MAP);
    }

    #[test]
    fn test_negative_threshold_rejected() {
        let err = Config::from_toml_str("[service]\ncalls_till_next_map = -1\n").unwrap_err();
        match err {
            Error::Config(msg) => assert!(msg.contains("service.calls_till_next_map")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_fixture_list_rejected() {
        let err = Config::from_toml_str("[fixtures]\npoint_clouds = []\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_chunk_size_bounds() {
        assert!(Config::from_toml_str("[streaming]\nchunk_size_bytes = 0\n").is_err());
        let too_big = format!("[streaming]\nchunk_size_bytes = {}\n", MAX_CHUNK_SIZE + 1);
        assert!(Config::from_toml_str(&too_big).is_err());
    }

    #[test]
    fn test_from_attributes() {
        let attrs = serde_json::json!({ "calls_till_next_map": 3, "is_localizing": true });
        let service = ServiceConfig::from_attributes(&attrs).unwrap();
        assert_eq!(service.resolved_threshold(), 3);
        assert!(service.is_localizing);
        assert_eq!(service.name, "fake-slam");

        let bad = serde_json::json!({ "calls_till_next_map": "five" });
        assert!(matches!(
            ServiceConfig::from_attributes(&bad),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_relative_fixture_paths_resolved() {
        let mut fixtures = FixturesConfig {
            point_clouds: vec![PathBuf::from("a.pcd"), PathBuf::from("/abs/b.pcd")],
            internal_state: PathBuf::from("state.pbstream"),
        };
        fixtures.resolve_relative_to(Path::new("/etc/chhaya"));
        assert_eq!(fixtures.point_clouds[0], Path::new("/etc/chhaya/a.pcd"));
        assert_eq!(fixtures.point_clouds[1], Path::new("/abs/b.pcd"));
        assert_eq!(
            fixtures.internal_state,
            Path::new("/etc/chhaya/state.pbstream")
        );
    }

    #[test]
    fn test_default_fixtures_live_next_to_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("chhaya.toml");
        fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        let fixtures = dir.path().join("fixtures");
        assert_eq!(config.fixtures.point_clouds.len(), 3);
        assert_eq!(
            config.fixtures.point_clouds[0],
            fixtures.join("pointcloud_2.pcd")
        );
        assert_eq!(
            config.fixtures.internal_state,
            fixtures.join("internal_state.pbstream")
        );
    }
}
