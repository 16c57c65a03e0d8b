// src/config.rs - Retry policies and recovery configuration
use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// A bounded polling budget: fixed poll interval plus a wall-clock timeout.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

/// Recovery commands understood by the moonraker API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryCommand {
    Restart,
    FirmwareRestart,
}

impl RecoveryCommand {
    pub fn path(self) -> &'static str {
        match self {
            Self::Restart => "printer/restart",
            Self::FirmwareRestart => "printer/firmware_restart",
        }
    }
}

impl fmt::Display for RecoveryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Restart => "RESTART",
            Self::FirmwareRestart => "FIRMWARE_RESTART",
        };
        write!(f, "{}", name)
    }
}

/// Tunable parameters for one recovery run.
///
/// All timings are adjustable; the defaults match what works well on a
/// moonraker host that has just had its USB cable replugged. The escalation
/// order is an explicit sequence because firmwares disagree on which restart
/// flavor is the gentler first attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct RecoveryConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_debounce_timeout_secs")]
    pub debounce_timeout_secs: u64,

    #[serde(default = "default_stabilization_timeout_secs")]
    pub stabilization_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_escalation")]
    pub escalation: Vec<RecoveryCommand>,
}

// Default value functions
fn default_poll_interval_secs() -> u64 { 1 }
fn default_debounce_timeout_secs() -> u64 { 15 }
fn default_stabilization_timeout_secs() -> u64 { 120 }
fn default_request_timeout_secs() -> u64 { 10 }
fn default_escalation() -> Vec<RecoveryCommand> {
    vec![RecoveryCommand::Restart, RecoveryCommand::FirmwareRestart]
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            debounce_timeout_secs: default_debounce_timeout_secs(),
            stabilization_timeout_secs: default_stabilization_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            escalation: default_escalation(),
        }
    }
}

impl RecoveryConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: RecoveryConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.poll_interval_secs == 0 {
            return Err("poll_interval_secs must be positive".into());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be positive".into());
        }
        Ok(())
    }

    pub fn debounce_policy(&self) -> RetryPolicy {
        RetryPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            timeout: Duration::from_secs(self.debounce_timeout_secs),
        }
    }

    pub fn stabilization_policy(&self) -> RetryPolicy {
        RetryPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            timeout: Duration::from_secs(self.stabilization_timeout_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RecoveryConfig::default();
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.debounce_timeout_secs, 15);
        assert_eq!(config.stabilization_timeout_secs, 120);
        assert_eq!(
            config.escalation,
            vec![RecoveryCommand::Restart, RecoveryCommand::FirmwareRestart]
        );
    }

    #[test]
    fn test_parse_partial_toml_fills_defaults() {
        let config: RecoveryConfig = toml::from_str(
            r#"
debounce_timeout_secs = 30
"#,
        )
        .unwrap();

        assert_eq!(config.debounce_timeout_secs, 30);
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.stabilization_timeout_secs, 120);
    }

    #[test]
    fn test_parse_escalation_order() {
        let config: RecoveryConfig = toml::from_str(
            r#"
escalation = ["firmware_restart", "restart"]
"#,
        )
        .unwrap();

        assert_eq!(
            config.escalation,
            vec![RecoveryCommand::FirmwareRestart, RecoveryCommand::Restart]
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_secs = 2").unwrap();
        writeln!(file, "stabilization_timeout_secs = 60").unwrap();

        let config = RecoveryConfig::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.stabilization_timeout_secs, 60);
        assert_eq!(config.debounce_timeout_secs, 15);
    }

    #[test]
    fn test_config_validation() {
        let mut config = RecoveryConfig::default();
        assert!(config.validate().is_ok());

        config.poll_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_command_paths() {
        assert_eq!(RecoveryCommand::Restart.path(), "printer/restart");
        assert_eq!(
            RecoveryCommand::FirmwareRestart.path(),
            "printer/firmware_restart"
        );
    }
}
