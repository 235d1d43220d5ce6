//! Configuration for the bridge.
//!
//! Values are layered, later sources winning: the built-in defaults below, then an
//! optional TOML file, then a handful of `GAMEBOT_*` environment variables. Command
//! line flags are applied by the binary on top of whatever this crate returns.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use gamebot_integrations::Log;

mod env;
pub use env::EnvOverrides;

mod errors;
pub use errors::ConfigError;

/// Listening ports used when nothing else is configured.
pub const DEFAULT_P1_PORT: u16 = 9999;
pub const DEFAULT_P2_PORT: u16 = 10000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    pub transport: TransportConfig,
    pub telemetry: TelemetryConfig,
    pub strategy: StrategyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    pub host: String,
    pub p1_port: u16,
    pub p2_port: u16,

    /// Largest single JSON frame we are willing to buffer.
    pub max_frame_bytes: usize,

    /// How long a read may block before the loop checks for a shutdown request.
    pub poll_interval_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            p1_port: DEFAULT_P1_PORT,
            p2_port: DEFAULT_P2_PORT,
            max_frame_bytes: 4096,
            poll_interval_ms: 100,
        }
    }
}

impl TransportConfig {
    /// The port for player slot `1` or `2`.
    pub fn port_for(&self, slot: u8) -> u16 {
        match slot {
            2 => self.p2_port,
            _ => self.p1_port,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub path: PathBuf,

    /// Row count that forces a flush.
    pub capacity: usize,
    pub flush_interval_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("GameData.csv"),
            capacity: 50,
            flush_interval_ms: 1000,
        }
    }
}

impl TelemetryConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyConfig {
    /// Fixed seed for maneuver selection. Unset means a fresh seed per run.
    pub seed: Option<u64>,

    /// Horizontal distance beyond which the scripted strategy uses ranged maneuvers.
    pub engage_distance: i32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            seed: None,
            engage_distance: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: String::from("info"),
        }
    }
}

impl BridgeConfig {
    /// Builds the configuration from defaults, the file at `path` (if any) and the
    /// process environment, then validates it.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, EnvOverrides::from_env()?)
    }

    /// Same as `load`, with the environment layer supplied by the caller.
    pub fn load_with(path: Option<&Path>, env: EnvOverrides) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let config = base.merge(env);
        config.validate()?;

        tracing::debug!(target: Log::Config, ?config, "Configuration loaded");
        Ok(config)
    }

    /// Parses a TOML file. Missing keys fall back to their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(target: Log::Config, ?path, "Read configuration file");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telemetry.capacity == 0 {
            return Err(ConfigError::Invalid("telemetry.capacity must be at least 1".into()));
        }

        if self.transport.max_frame_bytes == 0 {
            return Err(ConfigError::Invalid("transport.max_frame_bytes must be at least 1".into()));
        }

        if self.transport.p1_port == self.transport.p2_port {
            return Err(ConfigError::Invalid(format!(
                "transport.p1_port and transport.p2_port are both {}",
                self.transport.p1_port
            )));
        }

        if self.strategy.engage_distance < 0 {
            return Err(ConfigError::Invalid("strategy.engage_distance cannot be negative".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = BridgeConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.transport.port_for(1), 9999);
        assert_eq!(config.transport.port_for(2), 10000);
        assert_eq!(config.telemetry.capacity, 50);
        assert_eq!(config.telemetry.flush_interval(), Duration::from_secs(1));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[telemetry]\ncapacity = 200\n\n[strategy]\nseed = 7").unwrap();

        let config = BridgeConfig::load_with(Some(file.path()), EnvOverrides::default()).unwrap();

        assert_eq!(config.telemetry.capacity, 200);
        assert_eq!(config.strategy.seed, Some(7));
        assert_eq!(config.transport, TransportConfig::default());
    }

    #[test]
    fn environment_wins_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[transport]\nhost = \"10.0.0.2\"").unwrap();

        let env = EnvOverrides {
            host: Some("192.168.1.5".into()),
            ..Default::default()
        };
        let config = BridgeConfig::load_with(Some(file.path()), env).unwrap();

        assert_eq!(config.transport.host, "192.168.1.5");
    }

    #[test]
    fn unknown_keys_are_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[transport]\nhots = \"x\"").unwrap();

        let err = BridgeConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = BridgeConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = BridgeConfig::default();
        config.telemetry.capacity = 0;
        assert!(config.validate().is_err());

        let mut config = BridgeConfig::default();
        config.transport.max_frame_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = BridgeConfig::default();
        config.transport.p2_port = config.transport.p1_port;
        assert!(config.validate().is_err());
    }
}
