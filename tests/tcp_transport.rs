//! End-to-end tests: config file -> fixtures on disk -> TCP server -> client.

use chhaya_slam::config::Config;
use chhaya_slam::core::types::{CommandMap, MappingMode};
use chhaya_slam::replay::ReplaySlam;
use chhaya_slam::replay::fixtures::FixtureSet;
use chhaya_slam::streaming::{SlamClient, SlamServer, WireFormat};
use chhaya_slam::{Error, SlamService};
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    addr: SocketAddr,
    format: WireFormat,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Harness {
    /// Write fixtures and a config file, then start a server on an ephemeral port
    fn start(format: WireFormat, extra_service: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pcd"), vec![b'a'; 300]).unwrap();
        fs::write(dir.path().join("b.pcd"), vec![b'b'; 1000]).unwrap();
        fs::write(dir.path().join("state.pbstream"), vec![9u8; 2048]).unwrap();

        let wire = match format {
            WireFormat::Json => "json",
            WireFormat::Postcard => "postcard",
        };
        let toml = format!(
            r#"
[service]
name = "e2e-slam"
{extra_service}

[fixtures]
point_clouds = ["a.pcd", "b.pcd"]
internal_state = "state.pbstream"

[streaming]
chunk_size_bytes = 256

[network]
bind_address = "127.0.0.1:0"
wire_format = "{wire}"
"#
        );
        let config_path = dir.path().join("chhaya.toml");
        fs::write(&config_path, toml).unwrap();

        let config = Config::load(&config_path).unwrap();
        let fixtures = FixtureSet::load(&config.fixtures).unwrap();
        let service: Arc<dyn SlamService> = Arc::new(ReplaySlam::new(&config, fixtures));

        let running = Arc::new(AtomicBool::new(true));
        let server = SlamServer::bind(
            &config.network.bind_address,
            service,
            config.network.wire_format,
            Arc::clone(&running),
        )
        .unwrap();
        let addr = server.local_addr().unwrap();
        let handle = thread::spawn(move || server.run().unwrap());

        Self {
            _dir: dir,
            addr,
            format,
            running,
            handle: Some(handle),
        }
    }

    fn client(&self) -> SlamClient {
        let mut client = SlamClient::connect(self.addr, self.format).unwrap();
        client.set_timeout(Some(Duration::from_secs(5))).unwrap();
        client
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn exercise(format: WireFormat) {
    let harness = Harness::start(format, "calls_till_next_map = 2");
    let mut client = harness.client();

    assert_eq!(client.name().unwrap(), "e2e-slam");

    // threshold 2, 2 fixtures: index = (k / 2) % 2
    for k in 1..=6u64 {
        let expected = if (k / 2) % 2 == 0 { (b'a', 300) } else { (b'b', 1000) };
        let chunks = client.point_cloud_map_chunks(false).unwrap();
        let map = chunks.concat();

        assert_eq!(map.len(), expected.1, "call {k}");
        assert!(map.iter().all(|&b| b == expected.0));
        assert_eq!(chunks.len(), expected.1.div_ceil(256));
    }

    let state = client.internal_state().unwrap();
    assert_eq!(state, vec![9u8; 2048]);

    let properties = client.properties().unwrap();
    assert!(!properties.cloud_slam);
    assert_eq!(properties.mapping_mode, MappingMode::NewMap);
    assert_eq!(properties.internal_state_file_type, ".pbstream");

    let pose = client.position().unwrap();
    assert!((0.0..360.0).contains(&pose.theta));

    let mut command = CommandMap::new();
    command.insert("anything".to_string(), serde_json::json!({"nested": [1, 2]}));
    assert!(client.do_command(&command).unwrap().is_empty());
}

#[test]
fn test_round_trip_json() {
    exercise(WireFormat::Json);
}

#[test]
fn test_round_trip_postcard() {
    exercise(WireFormat::Postcard);
}

#[test]
fn test_localizing_mode_reported() {
    let harness = Harness::start(WireFormat::Json, "is_localizing = true");
    let mut client = harness.client();
    assert_eq!(
        client.properties().unwrap().mapping_mode,
        MappingMode::LocalizationOnly
    );
}

#[test]
fn test_clients_share_rotation() {
    let harness = Harness::start(WireFormat::Postcard, "calls_till_next_map = 1");
    let mut first = harness.client();
    let mut second = harness.client();

    // Calls alternate fixtures regardless of which client asks
    assert_eq!(first.point_cloud_map(false).unwrap().len(), 1000);
    assert_eq!(second.point_cloud_map(false).unwrap().len(), 300);
    assert_eq!(first.point_cloud_map(true).unwrap().len(), 1000);
}

#[test]
fn test_wrong_wire_format_reports_error() {
    let harness = Harness::start(WireFormat::Json, "");
    let mut client = SlamClient::connect(harness.addr, WireFormat::Postcard).unwrap();
    client.set_timeout(Some(Duration::from_secs(5))).unwrap();

    // Server replies with a JSON error frame the postcard client cannot decode
    assert!(matches!(
        client.name(),
        Err(Error::Serialization(_)) | Err(Error::Remote(_))
    ));
}
