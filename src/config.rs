use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::encounter::CombatDefaults;
use crate::core::session::tracker::DEFAULT_UNDO_LIMIT;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Missing(PathBuf),
    Invalid { path: PathBuf, error: String },
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            Self::File(path) => log::info!("Loaded config from {}", path.display()),
            Self::Missing(path) => log::debug!("No config file at {}, using defaults", path.display()),
            Self::Invalid { path, error } => {
                log::warn!("{} at {}, using defaults", error, path.display())
            }
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub combat: CombatConfig,
    pub logging: LoggingConfig,
    pub data: DataConfig,
}

/// Combat defaults and undo depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Number of undo snapshots kept per combat.
    pub undo_limit: usize,
    /// Initiative for combatants without one.
    pub default_initiative: i32,
    /// Max HP for combatants without a stat block.
    pub default_hp: i32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter level; `RUST_LOG` takes precedence.
    pub level: String,
    /// Override the log directory.
    pub log_dir: Option<PathBuf>,
    /// Also log to stderr.
    pub stderr: bool,
}

/// Data directory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for CombatConfig {
    fn default() -> Self {
        let defaults = CombatDefaults::default();
        Self {
            undo_limit: DEFAULT_UNDO_LIMIT,
            default_initiative: defaults.initiative,
            default_hp: defaults.hp,
        }
    }
}

impl CombatConfig {
    pub fn defaults(&self) -> CombatDefaults {
        CombatDefaults {
            initiative: self.default_initiative,
            hp: self.default_hp,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            stderr: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/combat-tracker/config.toml`.
    /// Falls back to `Default` if the file is missing or unparseable; the
    /// returned origin says which, for logging once a subscriber exists.
    pub fn load() -> (Self, ConfigOrigin) {
        Self::load_or_default(&Self::config_path())
    }

    pub fn load_or_default(path: &Path) -> (Self, ConfigOrigin) {
        match Self::load_from(path) {
            Ok(config) => (config, ConfigOrigin::File(path.to_path_buf())),
            Err(ConfigError::Io(_)) => (Self::default(), ConfigOrigin::Missing(path.to_path_buf())),
            Err(e) => (
                Self::default(),
                ConfigOrigin::Invalid {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                },
            ),
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("combat-tracker"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    /// Resolved log directory (override or `<data_dir>/logs`).
    pub fn log_dir(&self) -> PathBuf {
        self.logging
            .log_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("logs"))
    }

    /// Default export file inside the data directory.
    pub fn default_export_path(&self) -> PathBuf {
        self.data_dir().join("combat-tracker.json")
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("combat-tracker").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
