//! # Register Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`POSGO_*`)
//! 2. Config file (`posgo.toml`)
//! 3. Defaults (this file)
//!
//! ## Example `posgo.toml`
//! ```toml
//! [store]
//! name = "Bodega Doña Rosa"
//!
//! [currency]
//! symbol = "S/ "
//! decimals = 2
//!
//! [cash]
//! consistency = "strict"
//! allow_negative_drawer = false
//! recent_movements = 5
//!
//! [database]
//! path = "/var/lib/posgo/posgo.db"
//! ```
//!
//! Configuration is read-only after loading, so no lock is needed.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0}")]
    Invalid(String),
}

/// What the coordinator does with its optimistic update when a write fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyMode {
    /// Keep the optimistic update; the reload after the write reconciles.
    #[default]
    Optimistic,

    /// Restore the pre-action working copy when the write fails.
    Strict,
}

impl FromStr for ConsistencyMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "optimistic" => Ok(ConsistencyMode::Optimistic),
            "strict" => Ok(ConsistencyMode::Strict),
            other => Err(ConfigError::Invalid(format!(
                "unknown consistency mode '{}'",
                other
            ))),
        }
    }
}

/// Store display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub name: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: "PosGo".to_string(),
        }
    }
}

/// How amounts are printed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencySettings {
    pub symbol: String,
    pub decimals: u8,
}

impl Default for CurrencySettings {
    fn default() -> Self {
        CurrencySettings {
            symbol: "S/ ".to_string(),
            decimals: 2,
        }
    }
}

/// Cash drawer behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CashSettings {
    pub consistency: ConsistencyMode,

    /// When false, a cash-out larger than the expected drawer is refused.
    pub allow_negative_drawer: bool,

    /// Movements shown in the status view.
    pub recent_movements: usize,
}

impl Default for CashSettings {
    fn default() -> Self {
        CashSettings {
            consistency: ConsistencyMode::Optimistic,
            allow_negative_drawer: true,
            recent_movements: 3,
        }
    }
}

/// Local database location. `None` means the platform data directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: Option<PathBuf>,
}

/// Register configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub currency: CurrencySettings,

    #[serde(default)]
    pub cash: CashSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl RegisterConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file: `config_path`, else `POSGO_CONFIG`, else
    ///    `<config dir>/posgo.toml`
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = config_path
            .or_else(|| std::env::var_os("POSGO_CONFIG").map(PathBuf::from))
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                info!(?path, "Loading register config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML file, without environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.currency.decimals > 4 {
            return Err(ConfigError::Invalid(format!(
                "currency.decimals must be at most 4, got {}",
                self.currency.decimals
            )));
        }

        if self.cash.recent_movements == 0 {
            return Err(ConfigError::Invalid(
                "cash.recent_movements must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("POSGO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Ok(name) = std::env::var("POSGO_STORE_NAME") {
            self.store.name = name;
        }

        if let Ok(symbol) = std::env::var("POSGO_CURRENCY_SYMBOL") {
            self.currency.symbol = symbol;
        }

        if let Ok(mode) = std::env::var("POSGO_CONSISTENCY") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding consistency mode from environment");
                    self.cash.consistency = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown consistency mode in environment"),
            }
        }

        if let Ok(allow) = std::env::var("POSGO_ALLOW_NEGATIVE_DRAWER") {
            match allow.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.cash.allow_negative_drawer = true,
                "0" | "false" | "no" => self.cash.allow_negative_drawer = false,
                _ => warn!(value = %allow, "Ignoring POSGO_ALLOW_NEGATIVE_DRAWER"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "posgo", "register")
            .map(|dirs| dirs.config_dir().join("posgo.toml"))
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = RegisterConfig::default();
    /// assert_eq!(config.format_currency(1234), "S/ 12.34");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let decimals = u32::from(self.currency.decimals);
        let divisor = 10_i64.pow(decimals);
        // Money is always held in cents
        let scaled = if decimals >= 2 {
            cents.saturating_mul(10_i64.pow(decimals - 2))
        } else {
            cents / 10_i64.pow(2 - decimals)
        };
        let whole = scaled / divisor;
        let frac = (scaled % divisor).abs();

        format!(
            "{}{}{}",
            if scaled < 0 { "-" } else { "" },
            self.currency.symbol,
            if decimals > 0 {
                format!("{}.{:0width$}", whole.abs(), frac, width = decimals as usize)
            } else {
                whole.abs().to_string()
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_positive() {
        let config = RegisterConfig::default();
        assert_eq!(config.format_currency(1234), "S/ 12.34");
        assert_eq!(config.format_currency(100), "S/ 1.00");
        assert_eq!(config.format_currency(1), "S/ 0.01");
        assert_eq!(config.format_currency(0), "S/ 0.00");
    }

    #[test]
    fn test_format_currency_negative() {
        let config = RegisterConfig::default();
        assert_eq!(config.format_currency(-1234), "-S/ 12.34");
    }

    #[test]
    fn test_format_currency_without_decimals() {
        let mut config = RegisterConfig::default();
        config.currency.symbol = "$".to_string();
        config.currency.decimals = 0;
        assert_eq!(config.format_currency(12_300), "$123");
    }

    #[test]
    fn test_defaults() {
        let config = RegisterConfig::default();
        assert_eq!(config.cash.consistency, ConsistencyMode::Optimistic);
        assert!(config.cash.allow_negative_drawer);
        assert_eq!(config.cash.recent_movements, 3);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posgo.toml");
        std::fs::write(
            &path,
            "[cash]\nconsistency = \"strict\"\nallow_negative_drawer = false\n",
        )
        .unwrap();

        let config = RegisterConfig::from_file(&path).unwrap();
        assert_eq!(config.cash.consistency, ConsistencyMode::Strict);
        assert!(!config.cash.allow_negative_drawer);
        assert_eq!(config.cash.recent_movements, 3);
        assert_eq!(config.store.name, "PosGo");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posgo.toml");
        std::fs::write(&path, "[cash\nconsistency = ").unwrap();

        assert!(matches!(
            RegisterConfig::from_file(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_recent() {
        let mut config = RegisterConfig::default();
        config.cash.recent_movements = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_consistency_parse() {
        assert_eq!("Strict".parse::<ConsistencyMode>().unwrap(), ConsistencyMode::Strict);
        assert!("eventual".parse::<ConsistencyMode>().is_err());
    }
}
