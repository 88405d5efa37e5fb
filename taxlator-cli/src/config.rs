//! Layered configuration.
//!
//! Precedence, lowest first: built-in defaults, the TOML config file, then
//! command-line flags. The file is the one named by `--config`, else
//! `$TAXLATOR_CONFIG`, else `./taxlator.toml` when it exists.
//!
//! ```toml
//! [database]
//! backend = "sqlite"
//! connection_string = "taxlator.db"
//!
//! [rates]
//! file = "rates.toml"
//! bands_file = "bands.csv"
//!
//! [history]
//! enabled = true
//! retention_days = 7
//!
//! [logging]
//! level = "info"
//! file = "taxlator.log"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use taxlator_core::db::DbConfig;
use thiserror::Error;

use crate::cli::GlobalArgs;

pub const CONFIG_ENV_VAR: &str = "TAXLATOR_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "taxlator.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "taxlator.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatesConfig {
    /// TOML rate file. The built-in 2026 table is used when unset.
    pub file: Option<PathBuf>,
    /// Band CSV applied after the rate file.
    pub bands_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub retention_days: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            retention_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Bare level or any `EnvFilter` directive. `RUST_LOG` outranks it and
    /// `--log-level` outranks both.
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub rates: RatesConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Builds the effective configuration for one run.
    pub fn load(args: &GlobalArgs) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        let mut config = match resolve_config_path(args.config.as_deref(), env_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(args);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Applies command-line flags on top of the file settings.
    pub fn apply_overrides(
        &mut self,
        args: &GlobalArgs,
    ) {
        if let Some(db) = &args.db {
            self.database.connection_string = db.clone();
        }
        if let Some(rates) = &args.rates {
            self.rates.file = Some(rates.clone());
        }
        if let Some(bands) = &args.bands {
            self.rates.bands_file = Some(bands.clone());
        }
        if args.no_history {
            self.history.enabled = false;
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.backend.trim().is_empty() {
            return Err(ConfigError::Invalid("database.backend must not be empty".to_string()));
        }
        if self.database.connection_string.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "database.connection_string must not be empty".to_string(),
            ));
        }
        if self.history.retention_days == 0 {
            return Err(ConfigError::Invalid(
                "history.retention_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            backend: self.database.backend.clone(),
            connection_string: self.database.connection_string.clone(),
        }
    }
}

/// Picks the config file: explicit flag, then environment, then
/// `./taxlator.toml` if present. `None` means defaults only.
pub fn resolve_config_path(
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = from_env.filter(|p| !p.as_os_str().is_empty()) {
        return Some(path);
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    local.is_file().then_some(local)
}
