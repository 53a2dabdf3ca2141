//! Configuration management.
//!
//! Settings are resolved once at startup, lowest precedence first:
//! defaults, then a TOML file, then environment variables. Command-line
//! flags are applied on top by the binary. The resulting [`ArchiveConfig`]
//! is immutable and passed by reference.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "FLUXION_ARCHIVE_CONFIG_PATH";
/// Environment variable overriding the store path.
pub const DB_ENV: &str = "FLUXION_ARCHIVE_DB";
/// Environment variable overriding the log format.
pub const LOG_FORMAT_ENV: &str = "FLUXION_ARCHIVE_LOG_FORMAT";

/// Main configuration for fluxion-archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Path to the `SQLite` store.
    pub store_path: PathBuf,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive (e.g. `info`, `fluxion_archive=debug`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Log file; stderr when unset.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, multi-line.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(crate::Error::InvalidInput(format!("Unknown log format: {s}"))),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Store path.
    pub store_path: Option<String>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// Filter directive.
    pub level: Option<String>,
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("fluxion.db"),
            logging: LoggingConfig::default(),
        }
    }
}

impl ArchiveConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the configuration from file and process environment.
    ///
    /// The file is `explicit` if given, else the path in
    /// `FLUXION_ARCHIVE_CONFIG_PATH`, else the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be loaded, or an
    /// environment override is invalid.
    pub fn load(explicit: Option<&Path>) -> crate::Result<Self> {
        let from_env = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the platform config directory
    /// (`<config dir>/fluxion-archive/config.toml`).
    ///
    /// Returns default configuration if no usable config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let path = base_dirs
            .config_dir()
            .join("fluxion-archive")
            .join("config.toml");
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                Self::default()
            },
        }
    }

    /// Converts a `ConfigFile` to `ArchiveConfig`.
    fn from_config_file(file: ConfigFile) -> crate::Result<Self> {
        let mut config = Self::default();

        if let Some(store_path) = file.store_path {
            config.store_path = PathBuf::from(store_path);
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                config.logging.level = level;
            }
            if let Some(format) = logging.format {
                config.logging.format = format.parse()?;
            }
            config.logging.file = logging.file.map(PathBuf::from);
        }

        Ok(config)
    }

    /// Applies `FLUXION_ARCHIVE_DB` and `FLUXION_ARCHIVE_LOG_FORMAT` as
    /// resolved by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the log format override is not recognized.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> crate::Result<Self> {
        if let Some(db) = lookup(DB_ENV).filter(|v| !v.is_empty()) {
            self.store_path = PathBuf::from(db);
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV).filter(|v| !v.is_empty()) {
            self.logging.format = format.parse()?;
        }
        Ok(self)
    }

    /// Sets the store path.
    #[must_use]
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ArchiveConfig::new();
        assert_eq!(config.store_path, PathBuf::from("fluxion.db"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "store_path = \"/var/lib/fluxion/data.db\"\n\n[logging]\nlevel = \"debug\"\nformat = \"json\"\nfile = \"archive.log\"\n",
        )
        .unwrap();

        let config = ArchiveConfig::load_from_file(&path).unwrap();
        assert_eq!(config.store_path, PathBuf::from("/var/lib/fluxion/data.db"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.file, Some(PathBuf::from("archive.log")));
    }

    #[test]
    fn test_load_from_file_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[logging]\nformat = \"xml\"\n").unwrap();
        assert!(ArchiveConfig::load_from_file(&path).is_err());

        std::fs::write(&path, "unknown_key = 1\n").unwrap();
        assert!(ArchiveConfig::load_from_file(&path).is_err());

        assert!(ArchiveConfig::load_from_file(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            HashMap::from([(DB_ENV, "/tmp/other.db"), (LOG_FORMAT_ENV, "JSON")]);
        let config = ArchiveConfig::new()
            .with_env_overrides(|key| env.get(key).map(ToString::to_string))
            .unwrap();
        assert_eq!(config.store_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.logging.format, LogFormat::Json);

        let unchanged = ArchiveConfig::new().with_env_overrides(|_| None).unwrap();
        assert_eq!(unchanged, ArchiveConfig::new());
    }

    #[test]
    fn test_invalid_env_log_format() {
        let result = ArchiveConfig::new().with_env_overrides(|key| {
            (key == LOG_FORMAT_ENV).then(|| "yaml".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_override_wins() {
        let config = ArchiveConfig::new().with_store_path("cli.db");
        assert_eq!(config.store_path, PathBuf::from("cli.db"));
    }
}
