use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_NAMESPACE_PREFIX: &str = "logger-ns";
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 30;

/// On-disk layout of `config.yaml`. Every key is optional; see [`Config::from_file`].
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    kubeconfig_path: Option<String>,
    namespace_prefix: Option<String>,
    loki_address: Option<String>,
    loki_websocket_address: Option<String>,
    delay_for: Option<u64>,
    poll_interval: Option<u64>,
    probe_timeout: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub kubeconfig_path: PathBuf,
    pub namespace_prefix: String,
    pub loki_address: String,
    pub loki_websocket_address: String,
    pub delay_for: u64,
    pub poll_interval: Duration,
    pub probe_timeout: Duration,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        Self::from_yaml(&data)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(data: &str) -> anyhow::Result<Self> {
        // An empty document deserializes to unit, not to a map
        let raw: RawConfig = if data.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(data)?
        };

        let namespace_prefix = raw
            .namespace_prefix
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_NAMESPACE_PREFIX.to_string());

        let kubeconfig_path = match raw.kubeconfig_path.filter(|p| !p.is_empty()) {
            Some(p) => PathBuf::from(p),
            None => default_kubeconfig_path()?,
        };

        let probe_timeout = raw.probe_timeout.unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS);
        if probe_timeout == 0 {
            anyhow::bail!("probe_timeout must be greater than zero");
        }

        Ok(Config {
            kubeconfig_path,
            namespace_prefix,
            loki_address: raw.loki_address.unwrap_or_default(),
            loki_websocket_address: raw.loki_websocket_address.unwrap_or_default(),
            delay_for: raw.delay_for.unwrap_or(0),
            poll_interval: Duration::from_secs(raw.poll_interval.unwrap_or(0)),
            probe_timeout: Duration::from_secs(probe_timeout),
        })
    }
}

fn default_kubeconfig_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory for kubeconfig")?;
    Ok(home.join(".kube").join("config"))
}
