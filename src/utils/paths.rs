//! Resolution of the on-disk layout under the application home.

use std::{env, path::PathBuf};

use dirs::home_dir;

/// Overrides the application home when set.
pub const HOME_ENV: &str = "SPEND_TRACKER_HOME";

const DEFAULT_DIR_NAME: &str = ".spend_tracker";
const DATA_DIR: &str = "data";
const BACKUP_DIR: &str = "backups";
const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";
const CONFIG_BACKUP_DIR: &str = "backups";

/// `$SPEND_TRACKER_HOME`, else `~/.spend_tracker`.
pub fn app_home() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Directory holding `tracker.json`.
pub fn data_dir_in(root: &std::path::Path) -> PathBuf {
    root.join(DATA_DIR)
}

pub fn backups_dir_in(root: &std::path::Path) -> PathBuf {
    root.join(BACKUP_DIR)
}

pub fn config_file_in(home: &std::path::Path) -> PathBuf {
    home.join(CONFIG_DIR).join(CONFIG_FILE)
}

pub fn config_backups_dir_in(home: &std::path::Path) -> PathBuf {
    home.join(CONFIG_DIR).join(CONFIG_BACKUP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn layout_nests_under_the_given_root() {
        let root = Path::new("/srv/tracker");
        assert_eq!(data_dir_in(root), PathBuf::from("/srv/tracker/data"));
        assert_eq!(backups_dir_in(root), PathBuf::from("/srv/tracker/backups"));
        assert_eq!(
            config_file_in(root),
            PathBuf::from("/srv/tracker/config/config.json")
        );
        assert_eq!(
            config_backups_dir_in(root),
            PathBuf::from("/srv/tracker/config/backups")
        );
    }
}
