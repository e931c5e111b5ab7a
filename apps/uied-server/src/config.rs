//! Configuration management for UIED Server

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Longest-edge length the detector normalizes uploads to
pub const DEFAULT_LONGEST_EDGE: u32 = 1366;

/// Default request body limit (50 MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub detector: DetectorConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    /// Base URL of the detector process
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Target size of the longer image dimension, in pixels
    pub longest_edge: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "localhost".to_string(),
                port: 8080,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            detector: DetectorConfig {
                url: "http://localhost:8500".to_string(),
            },
            pipeline: PipelineConfig {
                longest_edge: DEFAULT_LONGEST_EDGE,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let longest_edge = parse_var("RESIZE_LONGEST_EDGE", defaults.pipeline.longest_edge)?;
        if longest_edge == 0 {
            return Err(ConfigError::InvalidValue {
                var: "RESIZE_LONGEST_EDGE",
                value: "0".to_string(),
            });
        }

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.server.max_upload_bytes)?,
            },
            detector: DetectorConfig {
                url: env::var("DETECTOR_URL").unwrap_or(defaults.detector.url),
            },
            pipeline: PipelineConfig { longest_edge },
        })
    }

    /// Address string suitable for `TcpListener::bind`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value }),
        Err(_) => Ok(default),
    }
}
