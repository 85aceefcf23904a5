//! # Application Configuration
//!
//! Settings are loaded once at startup in layers, later layers winning:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults            AppConfig::default()                           │
//! │  2. Settings file       kasir.toml in the platform config dir          │
//! │                         (or the path given with --config)              │
//! │  3. Environment         KASIR_<SECTION>__<KEY>=value                   │
//! │                         e.g. KASIR_STORE__NAME="Toko Makmur"           │
//! │                              KASIR_DATABASE__PATH=/tmp/kasir.db        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example `kasir.toml`
//! ```toml
//! [app]
//! name = "KasirNest"
//! theme = "dark"
//!
//! [store]
//! name = "Toko Makmur"
//! utc_offset_minutes = 420   # WIB
//!
//! [database]
//! auto_backup = true
//! backup_interval_hours = 24
//! ```

use chrono::{FixedOffset, Offset, Utc};
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "kasir.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "KASIR";

const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file or environment could not be read or parsed.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Could not determine the {0} directory for this platform")]
    NoPlatformDir(&'static str),

    #[error("Failed to write configuration: {0}")]
    Write(String),
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Write(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Write(err.to_string())
    }
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// `[app]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    pub version: String,
    /// Raises the default log level to debug.
    pub debug: bool,
    pub theme: Theme,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for AppSection {
    fn default() -> Self {
        AppSection {
            name: "KasirNest".to_string(),
            version: "1.0.0".to_string(),
            debug: false,
            theme: Theme::Light,
            window_width: 1200,
            window_height: 800,
        }
    }
}

/// `[store]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Printed on receipts.
    pub name: String,
    /// Shop-local offset from UTC. Decides where "today" starts for reports.
    pub utc_offset_minutes: i32,
}

impl Default for StoreSection {
    fn default() -> Self {
        StoreSection {
            name: "KasirNest".to_string(),
            utc_offset_minutes: 7 * 60,
        }
    }
}

/// `[security]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    /// Informational; sessions always last 24 hours.
    pub session_hours: i64,
    /// Keep the session in a file so a restart does not log the cashier out.
    pub persist_session: bool,
}

impl Default for SecuritySection {
    fn default() -> Self {
        SecuritySection {
            session_hours: kasir_core::SESSION_VALIDITY_HOURS,
            persist_session: true,
        }
    }
}

/// `[database]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Overrides the platform data directory location.
    pub path: Option<PathBuf>,
    pub auto_backup: bool,
    pub backup_interval_hours: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        DatabaseSection {
            path: None,
            auto_backup: true,
            backup_interval_hours: 24,
        }
    }
}

/// `[storage]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Overrides where product images are kept.
    pub images_dir: Option<PathBuf>,
}

// =============================================================================
// AppConfig
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub store: StoreSection,
    pub security: SecuritySection,
    pub database: DatabaseSection,
    pub storage: StorageSection,
}

impl AppConfig {
    /// Loads from the default settings file and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = default_config_path();
        Self::load_from(path.as_deref())
    }

    /// Loads from `path` (a missing file is fine) and the process environment.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Loads from `path` and the given variables instead of the process
    /// environment when `env` is `Some`.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the rest of the app cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app.name.trim().is_empty() {
            return Err(ConfigError::invalid("app.name", "must not be empty"));
        }
        if self.app.window_width == 0 || self.app.window_height == 0 {
            return Err(ConfigError::invalid("app.window", "size must be non-zero"));
        }
        if self.store.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::invalid(
                "store.utc_offset_minutes",
                format!("must be within ±{MAX_UTC_OFFSET_MINUTES}"),
            ));
        }
        if self.database.auto_backup && self.database.backup_interval_hours == 0 {
            return Err(ConfigError::invalid(
                "database.backup_interval_hours",
                "must be positive when auto_backup is on",
            ));
        }
        Ok(())
    }

    /// Writes the configuration as TOML, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// The shop's fixed UTC offset.
    pub fn store_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.store.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Database file: the override, or `kasir.db` in the data directory.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("kasir.db")),
        }
    }

    /// Image root: the override, or `images/` in the data directory.
    pub fn images_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.images_dir {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("images")),
        }
    }

    /// Where the session is kept between restarts, if it is kept at all.
    pub fn session_file(&self) -> Result<Option<PathBuf>, ConfigError> {
        if !self.security.persist_session {
            return Ok(None);
        }
        Ok(Some(data_dir()?.join("session.json")))
    }
}

// =============================================================================
// Platform Directories
// =============================================================================

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("id", "kasirnest", "KasirNest")
}

/// `kasir.toml` in the platform config directory.
///
/// - **Linux**: `~/.config/kasirnest/kasir.toml`
/// - **macOS**: `~/Library/Application Support/id.kasirnest.KasirNest/kasir.toml`
/// - **Windows**: `%APPDATA%\kasirnest\KasirNest\config\kasir.toml`
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn data_dir() -> Result<PathBuf, ConfigError> {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(ConfigError::NoPlatformDir("data"))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            AppConfig::load_with_env(Some(&dir.path().join("missing.toml")), env(&[])).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.app.name, "KasirNest");
        assert_eq!(config.store.utc_offset_minutes, 420);
        assert_eq!(config.store_offset().local_minus_utc(), 7 * 3600);
        assert!(config.database.auto_backup);
    }

    #[test]
    fn test_file_then_env_layering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kasir.toml");
        std::fs::write(
            &path,
            r#"
            [app]
            theme = "dark"
            debug = true

            [store]
            name = "Toko Makmur"
            utc_offset_minutes = 480
            "#,
        )
        .unwrap();

        let config = AppConfig::load_with_env(
            Some(&path),
            env(&[
                ("KASIR_STORE__NAME", "Toko Sejahtera"),
                ("KASIR_DATABASE__PATH", "/tmp/kasir-test.db"),
            ]),
        )
        .unwrap();

        assert_eq!(config.app.theme, Theme::Dark);
        assert!(config.app.debug);
        assert_eq!(config.store.name, "Toko Sejahtera");
        assert_eq!(config.store.utc_offset_minutes, 480);
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/kasir-test.db")
        );
        // untouched sections keep their defaults
        assert_eq!(config.app.window_width, 1200);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.app.name = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "app.name"
        ));

        let mut config = AppConfig::default();
        config.store.utc_offset_minutes = 15 * 60;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.database.backup_interval_hours = 0;
        assert!(config.validate().is_err());
        config.database.auto_backup = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_theme_fails_to_load() {
        let result = AppConfig::load_with_env(None, env(&[("KASIR_APP__THEME", "neon")]));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("kasir.toml");

        let mut config = AppConfig::default();
        config.store.name = "Warung Bu Sri".to_string();
        config.storage.images_dir = Some(dir.path().join("img"));
        config.save(&path).unwrap();

        let loaded = AppConfig::load_with_env(Some(&path), env(&[])).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_session_file_follows_persist_flag() {
        let mut config = AppConfig::default();
        config.security.persist_session = false;
        assert!(config.session_file().unwrap().is_none());
    }
}
