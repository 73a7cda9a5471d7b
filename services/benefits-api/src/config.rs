use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "0.0.0.0:8443";
pub const DEFAULT_METRICS_BIND: &str = "0.0.0.0:8080";

// Service configuration sourced from environment variables, optionally
// overridden by the YAML file named in BENEFITS_CONFIG.
#[derive(Debug, Clone)]
pub struct BenefitsConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub directory_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BenefitsConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    directory_path: Option<PathBuf>,
}

impl BenefitsConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("BENEFITS_BIND")
            .unwrap_or_else(|_| DEFAULT_BIND.to_string())
            .parse()
            .with_context(|| "parse BENEFITS_BIND")?;
        let metrics_bind = std::env::var("BENEFITS_METRICS_BIND")
            .unwrap_or_else(|_| DEFAULT_METRICS_BIND.to_string())
            .parse()
            .with_context(|| "parse BENEFITS_METRICS_BIND")?;
        let directory_path = std::env::var("BENEFITS_DIRECTORY")
            .ok()
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Ok(Self {
            bind_addr,
            metrics_bind,
            directory_path,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("BENEFITS_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read BENEFITS_CONFIG: {path}"))?;
            let override_cfg: BenefitsConfigOverride = serde_yaml::from_str(&contents)
                .with_context(|| "parse benefits config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.metrics_bind {
                config.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
            }
            if let Some(value) = override_cfg.directory_path {
                config.directory_path = Some(value);
            }
        }
        Ok(config)
    }
}
