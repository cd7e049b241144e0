//! Process settings from environment variables
//!
//! Every variable is optional. With none set the service listens on 8080,
//! reads `config.json`, and polls `app=hello-app` pods in `hello-app` every 30s.

use crate::config::DEFAULT_CONFIG_PATH;
use crate::poller::{FailurePolicy, PollTarget};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default namespace to poll for pods
pub const DEFAULT_NAMESPACE: &str = "hello-app";

/// Default label selector for polled pods
pub const DEFAULT_LABEL_SELECTOR: &str = "app=hello-app";

/// Default poll cadence
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

pub const ENV_CONFIG_PATH: &str = "HELLO_APP_CONFIG";
pub const ENV_PORT: &str = "HELLO_APP_PORT";
pub const ENV_CLUSTER_AWARE: &str = "HELLO_APP_CLUSTER_AWARE";
pub const ENV_NAMESPACE: &str = "HELLO_APP_NAMESPACE";
pub const ENV_LABEL_SELECTOR: &str = "HELLO_APP_LABEL_SELECTOR";
pub const ENV_POLL_INTERVAL_SECS: &str = "HELLO_APP_POLL_INTERVAL_SECS";
pub const ENV_POLL_FAILURE: &str = "HELLO_APP_POLL_FAILURE";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings for the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Path of the JSON configuration file
    pub config_path: PathBuf,
    /// HTTP listen port
    pub port: u16,
    /// Run the pod poller and expose `/metrics`
    pub cluster_aware: bool,
    /// Which pods to poll
    pub poll_target: PollTarget,
    /// Time between poll cycles
    pub poll_interval: Duration,
    /// What a failed poll cycle does to the process
    pub failure_policy: FailurePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            port: DEFAULT_PORT,
            cluster_aware: true,
            poll_target: PollTarget::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Self::default();

        if let Some(path) = get(ENV_CONFIG_PATH) {
            settings.config_path = PathBuf::from(path);
        }
        if let Some(port) = get(ENV_PORT) {
            settings.port = parse(ENV_PORT, &port)?;
        }
        if let Some(flag) = get(ENV_CLUSTER_AWARE) {
            settings.cluster_aware = parse_bool(ENV_CLUSTER_AWARE, &flag)?;
        }
        if let Some(namespace) = get(ENV_NAMESPACE) {
            settings.poll_target.namespace = namespace;
        }
        if let Some(selector) = get(ENV_LABEL_SELECTOR) {
            settings.poll_target.label_selector = selector;
        }
        if let Some(secs) = get(ENV_POLL_INTERVAL_SECS) {
            let secs: u64 = parse(ENV_POLL_INTERVAL_SECS, &secs)?;
            if secs == 0 {
                return Err(SettingsError::Invalid {
                    var: ENV_POLL_INTERVAL_SECS,
                    value: secs.to_string(),
                    reason: "interval must be at least one second".to_string(),
                });
            }
            settings.poll_interval = Duration::from_secs(secs);
        }
        if let Some(policy) = get(ENV_POLL_FAILURE) {
            settings.failure_policy = parse(ENV_POLL_FAILURE, &policy)?;
        }

        Ok(settings)
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, SettingsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| SettingsError::Invalid {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::Invalid {
            var,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
