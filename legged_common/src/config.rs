//! TOML configuration primitives shared by the FSM binary and its tools.
//!
//! A config type derives `Deserialize`, implements [`Validate`] for its
//! bounds, and gets [`ConfigLoader::load`] / [`ConfigLoader::from_toml_str`]
//! through the blanket impl. Every loader reports the same [`ConfigError`].
//!
//! ```rust,no_run
//! use legged_common::config::{ConfigError, ConfigLoader, SharedConfig, Validate};
//! use legged_common::robot::RobotType;
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct BenchRig {
//!     #[serde(default)]
//!     shared: SharedConfig,
//!     robot_type: RobotType,
//! }
//!
//! impl Validate for BenchRig {
//!     fn validate(&self) -> Result<(), ConfigError> {
//!         self.shared.validate()
//!     }
//! }
//!
//! let rig = BenchRig::load(Path::new("rig.toml"))?;
//! println!("{} on {}", rig.shared.service_name, rig.robot_type);
//! # Ok::<(), ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Why a config could not be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("config file not found")]
    FileNotFound,

    /// Unreadable file or malformed TOML (including unknown enum values).
    #[error("invalid config: {0}")]
    ParseError(String),

    /// Well-formed TOML with a value outside its bounds.
    #[error("config out of bounds: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields embedded in application configs.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "legged-fsm-01"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_service_name() -> String {
    "legged-fsm".to_string()
}

impl SharedConfig {
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: default_service_name(),
        }
    }
}

/// Semantic validation run after deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Read, parse and validate. A missing file is `FileNotFound`, any other
/// read or TOML failure is `ParseError`, a failed [`Validate`] is
/// `ValidationError`.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned + Validate {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;
        debug!("config: {} bytes from {}", content.len(), path.display());
        Self::from_toml_str(&content)
    }

    fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl<T: serde::de::DeserializeOwned + Validate> ConfigLoader for T {}
