use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::ast::Module;

pub const DEFAULT_CONFIG_FILENAME: &str = "termcore.toml";

pub const CONFIG_TEMPLATE: &str = r#"version = 1

[engine]
cache_intersections = true

[output]
format = "text"
"#;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config {} is not valid TOML: {message}", path.display())]
    Toml { path: PathBuf, message: String },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("module {} is not valid JSON: {source}", path.display())]
    Module {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Result<Self, LoadError> {
        match value {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(LoadError::InvalidConfig(format!(
                "output.format must be \"text\" or \"json\": {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub cache_intersections: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cache_intersections: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub engine: EngineSettings,
    pub format: OutputFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            format: OutputFormat::Text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    version: u32,
    #[serde(default)]
    engine: RawEngine,
    #[serde(default)]
    output: RawOutput,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawEngine {
    cache_intersections: bool,
}

impl Default for RawEngine {
    fn default() -> Self {
        Self {
            cache_intersections: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawOutput {
    format: String,
}

impl Default for RawOutput {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
        }
    }
}

pub fn parse_config(body: &str, path: &Path) -> Result<EngineConfig, LoadError> {
    let raw: RawConfig = toml::from_str(body).map_err(|err| LoadError::Toml {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    if raw.version != 1 {
        return Err(LoadError::InvalidConfig(format!(
            "version must be 1: {}",
            raw.version
        )));
    }
    Ok(EngineConfig {
        engine: EngineSettings {
            cache_intersections: raw.engine.cache_intersections,
        },
        format: OutputFormat::parse(&raw.output.format)?,
    })
}

pub fn load_config(path: &Path) -> Result<EngineConfig, LoadError> {
    let body = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&body, path)
}

/// Loads `path` if given, otherwise `termcore.toml` in `dir` when present, otherwise defaults.
pub fn resolve_config(path: Option<&Path>, dir: &Path) -> Result<EngineConfig, LoadError> {
    if let Some(path) = path {
        return load_config(path);
    }
    let default_path = dir.join(DEFAULT_CONFIG_FILENAME);
    if default_path.exists() {
        load_config(&default_path)
    } else {
        Ok(EngineConfig::default())
    }
}

pub fn load_module(path: &Path) -> Result<Module, LoadError> {
    let body = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&body).map_err(|source| LoadError::Module {
        path: path.to_path_buf(),
        source,
    })
}
