//! The environment layer. Each variable, when set, replaces one configured value.

use std::path::PathBuf;
use std::str::FromStr;

use crate::{BridgeConfig, ConfigError};

pub const HOST: &str = "GAMEBOT_HOST";
pub const TELEMETRY_PATH: &str = "GAMEBOT_TELEMETRY_PATH";
pub const TELEMETRY_ENABLED: &str = "GAMEBOT_TELEMETRY_ENABLED";
pub const SEED: &str = "GAMEBOT_SEED";
pub const LOG: &str = "GAMEBOT_LOG";

/// Values picked up from the environment. `None` means "not set, keep what we have".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub host: Option<String>,
    pub telemetry_path: Option<PathBuf>,
    pub telemetry_enabled: Option<bool>,
    pub seed: Option<u64>,
    pub log_filter: Option<String>,
}

impl EnvOverrides {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads overrides through `lookup`, which lets tests avoid touching the real
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Ok(Self {
            host: text(HOST),
            telemetry_path: text(TELEMETRY_PATH).map(PathBuf::from),
            telemetry_enabled: text(TELEMETRY_ENABLED).map(|v| parse_flag(TELEMETRY_ENABLED, v)).transpose()?,
            seed: text(SEED).map(|v| parse_value(SEED, v)).transpose()?,
            log_filter: text(LOG),
        })
    }
}

impl BridgeConfig {
    /// Merges environment overrides on top of this configuration. Values in `env`
    /// take precedence.
    pub fn merge(mut self, env: EnvOverrides) -> Self {
        if let Some(host) = env.host {
            self.transport.host = host;
        }

        if let Some(path) = env.telemetry_path {
            self.telemetry.path = path;
        }

        self.telemetry.enabled = env.telemetry_enabled.unwrap_or(self.telemetry.enabled);
        self.strategy.seed = env.seed.or(self.strategy.seed);

        if let Some(filter) = env.log_filter {
            self.logging.filter = filter;
        }

        self
    }
}

fn parse_flag(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv { name, value }),
    }
}

fn parse_value<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv { name, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn unset_environment_changes_nothing() {
        let env = EnvOverrides::from_lookup(lookup(&[])).unwrap();
        assert_eq!(env, EnvOverrides::default());
        assert_eq!(BridgeConfig::default().merge(env), BridgeConfig::default());
    }

    #[test]
    fn every_variable_is_applied() {
        let env = EnvOverrides::from_lookup(lookup(&[
            (HOST, "0.0.0.0"),
            (TELEMETRY_PATH, "/tmp/run.csv"),
            (TELEMETRY_ENABLED, "off"),
            (SEED, " 1234 "),
            (LOG, "gamebot=trace"),
        ]))
        .unwrap();

        let config = BridgeConfig::default().merge(env);

        assert_eq!(config.transport.host, "0.0.0.0");
        assert_eq!(config.telemetry.path, PathBuf::from("/tmp/run.csv"));
        assert!(!config.telemetry.enabled);
        assert_eq!(config.strategy.seed, Some(1234));
        assert_eq!(config.logging.filter, "gamebot=trace");
    }

    #[test]
    fn garbage_values_are_rejected() {
        let err = EnvOverrides::from_lookup(lookup(&[(SEED, "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: SEED, .. }));

        let err = EnvOverrides::from_lookup(lookup(&[(TELEMETRY_ENABLED, "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: TELEMETRY_ENABLED, .. }));
    }
}
