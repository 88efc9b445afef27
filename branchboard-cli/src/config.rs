//! Configuration loading with figment
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. `~/.config/branchboard/config.yaml`
//! 3. `./.branchboard/config.yaml`
//! 4. `BRANCHBOARD_*` environment variables

use branchboard::{Status, VersionKey};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "BRANCHBOARD_";

/// Project-local configuration directory
pub const PROJECT_DIR: &str = ".branchboard";

const CONFIG_FILE: &str = "config.yaml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A source could not be parsed or did not match the schema
    #[error("Failed to parse configuration: {source}")]
    ParseError { source: Box<figment::Error> },

    #[error("Invalid configuration value for key '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        ConfigError::ParseError {
            source: Box::new(error),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for the board CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Where task and version records are stored
    pub data_dir: PathBuf,
    /// Filter directive used when neither RUST_LOG nor --debug is given
    pub log_level: String,
    /// Status for `task add` without --status
    pub default_status: Status,
    /// Version for `task add` without --version
    pub default_version: VersionKey,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            data_dir: Path::new(PROJECT_DIR).join("data"),
            log_level: "warn".to_string(),
            default_status: Status::Todo,
            default_version: VersionKey::backlog(),
        }
    }
}

impl BoardConfig {
    /// Load from the user's home directory and the current directory
    pub fn load() -> ConfigResult<Self> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_from(dirs::home_dir().as_deref(), &cwd)
    }

    /// Load with explicit home and working directories
    pub fn load_from(home: Option<&Path>, cwd: &Path) -> ConfigResult<Self> {
        let config: BoardConfig = Self::figment(home, cwd).extract()?;
        config.validate()?;
        debug!(data_dir = %config.data_dir.display(), "loaded configuration");
        Ok(config)
    }

    fn figment(home: Option<&Path>, cwd: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(BoardConfig::default()));
        if let Some(home) = home {
            figment = figment.merge(Yaml::file(user_config_path(home)));
        }
        figment
            .merge(Yaml::file(project_config_path(cwd)))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "data_dir".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "log_level".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Replace the data directory when one was given on the command line
    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
        self
    }
}

/// `~/.config/branchboard/config.yaml`
pub fn user_config_path(home: &Path) -> PathBuf {
    home.join(".config").join("branchboard").join(CONFIG_FILE)
}

/// `./.branchboard/config.yaml`
pub fn project_config_path(cwd: &Path) -> PathBuf {
    cwd.join(PROJECT_DIR).join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    #[serial]
    fn test_defaults() {
        let home = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();

        let config = BoardConfig::load_from(Some(home.path()), cwd.path()).unwrap();
        assert_eq!(config, BoardConfig::default());
        assert_eq!(config.data_dir, PathBuf::from(".branchboard/data"));
    }

    #[test]
    #[serial]
    fn test_project_overrides_user() {
        let home = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        write(
            &user_config_path(home.path()),
            "log_level: info\ndefault_status: done\n",
        );
        write(&project_config_path(cwd.path()), "default_status: in_progress\n");

        let config = BoardConfig::load_from(Some(home.path()), cwd.path()).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.default_status, Status::InProgress);
        assert!(config.default_version.is_backlog());
    }

    #[test]
    #[serial]
    fn test_env_overrides_files() {
        let home = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        write(&project_config_path(cwd.path()), "default_version: v1\n");

        std::env::set_var("BRANCHBOARD_DEFAULT_VERSION", "v2");
        std::env::set_var("BRANCHBOARD_DATA_DIR", "/tmp/board-data");
        let result = BoardConfig::load_from(Some(home.path()), cwd.path());
        std::env::remove_var("BRANCHBOARD_DEFAULT_VERSION");
        std::env::remove_var("BRANCHBOARD_DATA_DIR");

        let config = result.unwrap();
        assert_eq!(config.default_version.as_str(), "v2");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/board-data"));
    }

    #[test]
    #[serial]
    fn test_bad_value_is_a_parse_error() {
        let home = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        write(&project_config_path(cwd.path()), "default_status: someday\n");

        let result = BoardConfig::load_from(Some(home.path()), cwd.path());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    #[serial]
    fn test_empty_log_level_is_invalid() {
        let home = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        write(&project_config_path(cwd.path()), "log_level: ''\n");

        let result = BoardConfig::load_from(Some(home.path()), cwd.path());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_command_line_data_dir_wins() {
        let config = BoardConfig::default().with_data_dir(Some(PathBuf::from("elsewhere")));
        assert_eq!(config.data_dir, PathBuf::from("elsewhere"));
        let config = BoardConfig::default().with_data_dir(None);
        assert_eq!(config.data_dir, PathBuf::from(".branchboard/data"));
    }
}
