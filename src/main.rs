//! ChhayaSLAM - Fixture-replay SLAM daemon
//!
//! Loads the fixture set once, then serves the SLAM contract over TCP until
//! Ctrl-C. Startup fails if any fixture is missing.

use chhaya_slam::config::Config;
use chhaya_slam::error::{Error, Result};
use chhaya_slam::replay::fixtures::FixtureSet;
use chhaya_slam::replay::{MODEL, ReplaySlam};
use chhaya_slam::streaming::SlamServer;
use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const DEFAULT_CONFIG_PATH: &str = "/etc/chhaya.toml";

/// Pick the config path out of the arguments that follow the program name.
///
/// Supports:
/// - `chhaya-slam <path>` (positional)
/// - `chhaya-slam --config <path>` (flag-based)
/// - `chhaya-slam -c <path>` (short flag)
///
/// A flag anywhere wins over the positional form. Falls back to
/// `/etc/chhaya.toml`.
fn parse_config_path(args: &[String]) -> String {
    let flagged = args
        .windows(2)
        .find(|pair| pair[0] == "--config" || pair[0] == "-c")
        .map(|pair| pair[1].clone());

    flagged
        .or_else(|| args.first().filter(|arg| !arg.starts_with('-')).cloned())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let config_path = parse_config_path(&args);
    let config = Config::load(&config_path)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("ChhayaSLAM v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Using config: {}", config_path);

    // Refuse to start on a partial fixture set
    let fixtures = FixtureSet::load(&config.fixtures)?;
    let service = Arc::new(ReplaySlam::new(&config, fixtures));

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let server = SlamServer::bind(
        &config.network.bind_address,
        service,
        config.network.wire_format,
        running,
    )?;

    log::info!("Serving {} as '{}'. Press Ctrl-C to stop.", MODEL, config.service.name);
    server.run()?;

    log::info!("ChhayaSLAM stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_without_arguments() {
        assert_eq!(parse_config_path(&[]), DEFAULT_CONFIG_PATH);
    }

    #[test]
    fn test_positional_path() {
        assert_eq!(parse_config_path(&args(&["site.toml"])), "site.toml");
    }

    #[test]
    fn test_flags_take_precedence() {
        assert_eq!(
            parse_config_path(&args(&["first.toml", "--config", "flag.toml"])),
            "flag.toml"
        );
        assert_eq!(parse_config_path(&args(&["-c", "short.toml"])), "short.toml");
    }

    #[test]
    fn test_dangling_flag_falls_back_to_default() {
        assert_eq!(parse_config_path(&args(&["--config"])), DEFAULT_CONFIG_PATH);
    }
}
