//! Tagged codec specs and loading them from TOML or JSON.
//!
//! A spec names an encoding scheme and carries its arguments:
//!
//! ```toml
//! kind = "trio"
//!
//! [args]
//! stepCount = 32
//!
//! [args.melody]
//! minPitch = 21
//! maxPitch = 108
//!
//! [args.bass]
//! minPitch = 33
//! maxPitch = 58
//! ```
//!
//! Checkpoint `config.json` files written for Magenta's converters load
//! unchanged: `type` is read as `kind`, and argument names such as
//! `numSteps` or `melArgs` are accepted as aliases.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::{build_codec, AnyCodec};

/// Spec loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read codec spec {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse codec spec {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported codec spec format: {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),
}

/// A codec kind plus its kind-specific arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecSpec {
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

impl CodecSpec {
    pub fn new(kind: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            args,
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e: toml::de::Error| ConfigError::Parse {
            path: PathBuf::from("<toml>"),
            message: e.to_string(),
        })
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<json>"),
            message: e.to_string(),
        })
    }

    /// Load a spec file, picking the format from its extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let is_toml = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => true,
            Some("json") => false,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let parsed = if is_toml {
            Self::from_toml_str(&contents)
        } else {
            Self::from_json_str(&contents)
        };
        parsed.map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    pub fn build(&self) -> crate::Result<AnyCodec> {
        build_codec(self)
    }
}

/// Load a spec file and build its codec.
pub fn load_codec(path: &Path) -> anyhow::Result<AnyCodec> {
    let spec = CodecSpec::load(path)
        .with_context(|| format!("loading codec spec {}", path.display()))?;
    spec.build()
        .with_context(|| format!("building {} codec from {}", spec.kind, path.display()))
}
