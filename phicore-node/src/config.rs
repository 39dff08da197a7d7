use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use phicore_engine::PhiConfig;
use phicore_proofs::ChainConfig;
use phicore_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ConfigFormat {
    Auto,
    Toml,
    Yaml,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {format:?} config: {details}")]
    Parse {
        format: ConfigFormat,
        details: String,
    },
    #[error("failed to render {format:?} config: {details}")]
    Render {
        format: ConfigFormat,
        details: String,
    },
    #[error("configuration invalid: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub node: NodeSection,
    #[serde(default)]
    pub engine: PhiConfig,
    pub chain: ChainConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeSection {
    /// Agent id used when a request does not name one.
    #[serde(default = "default_agent_id")]
    pub default_agent_id: String,
    /// Capacity of the broadcast channel behind published engine events.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_agent_id() -> String {
    "phicore-agent".into()
}

const fn default_event_buffer() -> usize {
    256
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.default_agent_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "default agent id must not be empty".into(),
            ));
        }
        if self.node.event_buffer == 0 {
            return Err(ConfigError::Validation(
                "event buffer must be greater than zero".into(),
            ));
        }
        if self.telemetry.max_latency_samples == 0 {
            return Err(ConfigError::Validation(
                "telemetry max latency samples must be greater than zero".into(),
            ));
        }
        if self.telemetry.flush_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "telemetry flush interval must be greater than zero".into(),
            ));
        }
        self.engine
            .validate()
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        self.chain
            .validate()
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        Ok(())
    }

    pub fn sample() -> Self {
        Self {
            node: NodeSection {
                default_agent_id: default_agent_id(),
                event_buffer: default_event_buffer(),
            },
            engine: PhiConfig::sample(),
            chain: ChainConfig::sample("phicore-a"),
            telemetry: TelemetryConfig::sample("http://localhost:4318"),
        }
    }

    pub fn render(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        match format {
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|err| ConfigError::Render {
                format,
                details: err.to_string(),
            }),
            ConfigFormat::Auto | ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|err| ConfigError::Render {
                    format: ConfigFormat::Toml,
                    details: err.to_string(),
                })
            }
        }
    }
}

pub fn load_config(path: &Path, format: ConfigFormat) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents, resolve_format(path, format))
}

/// Parse and validate. `Auto` is read as TOML since there is no path to inspect.
pub fn parse_config(contents: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let config: Config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(contents).map_err(|err| ConfigError::Parse {
            format,
            details: err.to_string(),
        }),
        ConfigFormat::Auto | ConfigFormat::Toml => {
            toml::from_str(contents).map_err(|err| ConfigError::Parse {
                format: ConfigFormat::Toml,
                details: err.to_string(),
            })
        }
    }?;
    config.validate()?;
    Ok(config)
}

pub fn resolve_format(path: &Path, format: ConfigFormat) -> ConfigFormat {
    match format {
        ConfigFormat::Auto => match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Toml,
        },
        _ => format,
    }
}
