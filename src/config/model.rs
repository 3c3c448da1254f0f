use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ConfigError;
use crate::domain::{check_amount, OwnerId};
use crate::storage::json_backend::DEFAULT_RETENTION;

/// Keys accepted by [`Config::set`].
pub const CONFIG_KEYS: &[&str] = &[
    "default_owner",
    "default_daily_limit",
    "seed_period_daily_limit",
    "backup_retention",
    "data_root",
    "color_output",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Principal the shell acts as until `user` switches it.
    #[serde(default = "Config::default_owner_value")]
    pub default_owner: String,
    /// Limit applied to new spending when neither the entry nor its period sets one.
    #[serde(default = "Config::default_daily_limit_value")]
    pub default_daily_limit: Decimal,
    /// Record the first entry's limit as its period default.
    #[serde(default)]
    pub seed_period_daily_limit: bool,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    /// Where `data/` and `backups/` live; the application home when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_root: Option<PathBuf>,
    #[serde(default = "Config::default_color_output")]
    pub color_output: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_period: Option<Uuid>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_owner: Self::default_owner_value(),
            default_daily_limit: Self::default_daily_limit_value(),
            seed_period_daily_limit: false,
            backup_retention: Self::default_backup_retention(),
            data_root: None,
            color_output: Self::default_color_output(),
            last_period: None,
        }
    }
}

impl Config {
    pub fn default_owner_value() -> String {
        "me".into()
    }

    pub fn default_daily_limit_value() -> Decimal {
        Decimal::ONE_HUNDRED
    }

    pub fn default_backup_retention() -> usize {
        DEFAULT_RETENTION
    }

    pub fn default_color_output() -> bool {
        true
    }

    pub fn owner(&self) -> Result<OwnerId, ConfigError> {
        OwnerId::new(self.default_owner.as_str())
            .ok_or_else(|| ConfigError::Invalid("default_owner cannot be empty".into()))
    }

    pub fn resolve_data_root(&self, home: &Path) -> PathBuf {
        self.data_root.clone().unwrap_or_else(|| home.to_path_buf())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.owner()?;
        check_amount(self.default_daily_limit, true).map_err(|violation| {
            ConfigError::Invalid(format!("default_daily_limit {violation}"))
        })?;
        if self.backup_retention == 0 {
            return Err(ConfigError::Invalid(
                "backup_retention must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Updates one setting from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut next = self.clone();
        match key {
            "default_owner" => next.default_owner = value.trim().to_string(),
            "default_daily_limit" => {
                next.default_daily_limit = value.trim().parse().map_err(|_| {
                    ConfigError::Invalid(format!("`{value}` is not a valid amount"))
                })?
            }
            "seed_period_daily_limit" => next.seed_period_daily_limit = parse_flag(key, value)?,
            "backup_retention" => {
                next.backup_retention = value.trim().parse().map_err(|_| {
                    ConfigError::Invalid(format!("`{value}` is not a valid count"))
                })?
            }
            "data_root" => {
                let trimmed = value.trim();
                next.data_root = match trimmed {
                    "" | "default" | "none" => None,
                    path => Some(PathBuf::from(path)),
                };
            }
            "color_output" => next.color_output = parse_flag(key, value)?,
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unknown setting `{other}` (expected one of: {})",
                    CONFIG_KEYS.join(", ")
                )))
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Settings as displayable key/value pairs.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("default_owner", self.default_owner.clone()),
            ("default_daily_limit", self.default_daily_limit.to_string()),
            (
                "seed_period_daily_limit",
                self.seed_period_daily_limit.to_string(),
            ),
            ("backup_retention", self.backup_retention.to_string()),
            (
                "data_root",
                self.data_root
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "(default)".into()),
            ),
            ("color_output", self.color_output.to_string()),
        ]
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::Invalid(format!(
            "{key} expects on/off, got `{value}`"
        ))),
    }
}
