// src/main.rs - klipper-recover CLI entry point
mod config;
mod control;
mod recover;
mod retry;
mod state;
#[cfg(test)]
mod testsupport;
mod transport;

use clap::Parser;
use reqwest::Url;

use crate::config::{RecoveryCommand, RecoveryConfig};
use crate::recover::{Outcome, Recovery};
use crate::transport::HttpTransport;

/// Recover an unresponsive klipper host by polling moonraker and escalating
/// restart commands until the printer reports ready or the budget runs out.
#[derive(Debug, Parser)]
#[command(name = "klipper-recover", version, about)]
struct Cli {
    /// Base URL of the moonraker API, e.g. http://mainsailos.local:7125/
    base_url: String,

    /// TOML file with retry policies and the escalation order
    #[arg(long)]
    config: Option<String>,

    /// Poll interval in seconds
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Window in seconds during which an early ready reading is distrusted
    #[arg(long)]
    debounce_timeout: Option<u64>,

    /// Budget in seconds for each wait for a final printer state
    #[arg(long)]
    stabilization_timeout: Option<u64>,

    /// Escalation command order, e.g. --escalation restart,firmware-restart
    #[arg(long, value_enum, value_delimiter = ',')]
    escalation: Vec<RecoveryCommand>,
}

fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|err| err.to_string())?;
    if url.host_str().is_none() {
        return Err("missing host component".to_string());
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    Ok(url)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();

    let base_url = match parse_base_url(&cli.base_url) {
        Ok(url) => url,
        Err(reason) => {
            tracing::error!("invalid base url '{}': {}", cli.base_url, reason);
            std::process::exit(2);
        }
    };

    let mut config = match &cli.config {
        Some(path) => match RecoveryConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!("failed to load config from '{}': {}", path, err);
                std::process::exit(2);
            }
        },
        None => RecoveryConfig::default(),
    };

    if let Some(secs) = cli.poll_interval {
        config.poll_interval_secs = secs;
    }
    if let Some(secs) = cli.debounce_timeout {
        config.debounce_timeout_secs = secs;
    }
    if let Some(secs) = cli.stabilization_timeout {
        config.stabilization_timeout_secs = secs;
    }
    if !cli.escalation.is_empty() {
        config.escalation = cli.escalation.clone();
    }

    if let Err(err) = config.validate() {
        tracing::error!("invalid configuration: {}", err);
        std::process::exit(2);
    }

    let transport = match HttpTransport::new(base_url, config.request_timeout()) {
        Ok(transport) => transport,
        Err(err) => {
            tracing::error!("{}", err);
            std::process::exit(2);
        }
    };

    let mut recovery = Recovery::new(transport, config);
    match recovery.run().await {
        Ok(Outcome::Failed) => std::process::exit(1),
        Ok(_) => {}
        Err(err) => {
            tracing::error!("transport failure, giving up: {}", err);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_requires_scheme_and_host() {
        assert!(parse_base_url("http://mainsailos.local:7125").is_ok());
        assert!(parse_base_url("https://192.168.1.50").is_ok());

        assert!(parse_base_url("mainsailos.local:7125").is_err());
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("file:///tmp/printer").is_err());
        assert!(parse_base_url("").is_err());
    }
}
