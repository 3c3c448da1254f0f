use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;
use tracing::info;

use crate::config::{Config, ConfigError};
use crate::utils::files::{list_backup_files, unused_backup_name, write_atomic};
use crate::utils::paths;

const BACKUP_PREFIX: &str = "config";

/// Handles persistence and backup management for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigManager {
    home: PathBuf,
    config_path: PathBuf,
    backups_dir: PathBuf,
}

impl ConfigManager {
    /// Manager rooted at the application home.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_base_dir(paths::app_home())
    }

    pub fn with_base_dir(home: PathBuf) -> Result<Self, ConfigError> {
        let backups_dir = paths::config_backups_dir_in(&home);
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            config_path: paths::config_file_in(&home),
            backups_dir,
            home,
        })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }
        let config = read_config(&self.config_path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        config.validate()?;
        write_atomic(&self.config_path, &to_json(config)?)?;
        Ok(())
    }

    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<String, ConfigError> {
        let (name, _) = unused_backup_name(&self.backups_dir, BACKUP_PREFIX, Utc::now(), note)?;
        write_atomic(&self.backups_dir.join(&name), &to_json(config)?)?;
        info!(backup = %name, "configuration backup written");
        Ok(name)
    }

    /// Loads a backup and makes it the active configuration.
    pub fn restore(&self, backup_name: &str) -> Result<Config, ConfigError> {
        let path = self.backups_dir.join(backup_name);
        if !path.exists() {
            return Err(ConfigError::Invalid(format!(
                "configuration backup `{backup_name}` not found"
            )));
        }
        let config = read_config(&path)?;
        self.save(&config)?;
        info!(backup = %backup_name, "configuration restored");
        Ok(config)
    }

    /// Backup names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>, ConfigError> {
        Ok(list_backup_files(&self.backups_dir, BACKUP_PREFIX)?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| ConfigError::Serde(err.to_string()))
}

fn to_json(config: &Config) -> Result<String, ConfigError> {
    serde_json::to_string_pretty(config).map_err(|err| ConfigError::Serde(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn save_load_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(manager.load().unwrap(), Config::default());

        let mut config = Config::default();
        config.default_daily_limit = dec!(75);
        manager.save(&config).unwrap();
        let backup = manager.backup(&config, Some("before change")).unwrap();
        assert!(backup.ends_with("_before-change.json"));

        config.default_daily_limit = dec!(20);
        manager.save(&config).unwrap();
        assert_eq!(manager.load().unwrap().default_daily_limit, dec!(20));

        let restored = manager.restore(&backup).unwrap();
        assert_eq!(restored.default_daily_limit, dec!(75));
        assert_eq!(manager.load().unwrap().default_daily_limit, dec!(75));
        assert_eq!(manager.list_backups().unwrap(), vec![backup]);
    }

    #[test]
    fn invalid_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        fs::write(manager.config_path(), r#"{ "backup_retention": 0 }"#).unwrap();
        assert!(matches!(manager.load(), Err(ConfigError::Invalid(_))));
        fs::write(manager.config_path(), "not json").unwrap();
        assert!(matches!(manager.load(), Err(ConfigError::Serde(_))));
    }
}
