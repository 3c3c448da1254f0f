use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::utils::files::{list_backup_files, unused_backup_name, write_atomic};

use super::{SnapshotBackend, StoreError, TrackerSnapshot};

const SNAPSHOT_FILE: &str = "tracker.json";
const BACKUP_PREFIX: &str = "tracker";
pub const DEFAULT_RETENTION: usize = 5;

/// Describes a persisted backup of the tracker snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub path: PathBuf,
}

/// Filesystem-backed JSON persistence for the tracker snapshot.
///
/// Every commit rewrites the snapshot by staging to a temporary file and
/// renaming it over the previous one, so readers never see a torn document.
#[derive(Debug, Clone)]
pub struct JsonBackend {
    snapshot_path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonBackend {
    pub fn new(data_dir: PathBuf, backups_dir: PathBuf) -> Result<Self, StoreError> {
        Self::with_retention(data_dir, backups_dir, DEFAULT_RETENTION)
    }

    pub fn with_retention(
        data_dir: PathBuf,
        backups_dir: PathBuf,
        retention: usize,
    ) -> Result<Self, StoreError> {
        fs::create_dir_all(&data_dir)?;
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            snapshot_path: data_dir.join(SNAPSHOT_FILE),
            backups_dir,
            retention: retention.max(1),
        })
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Writes the current snapshot into the backup directory, then prunes old copies.
    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo, StoreError> {
        let snapshot = self.load()?;
        let (file_name, now) = unused_backup_name(&self.backups_dir, BACKUP_PREFIX, Utc::now(), note)?;
        let path = self.backups_dir.join(&file_name);
        write_atomic(&path, &serialize_snapshot(&snapshot)?)?;
        info!(backup = %file_name, "snapshot backup written");
        self.prune_backups()?;
        Ok(BackupInfo {
            id: file_name,
            created_at: Some(now),
            path,
        })
    }

    /// Lists backups newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, StoreError> {
        Ok(list_backup_files(&self.backups_dir, BACKUP_PREFIX)?
            .into_iter()
            .map(|(id, created_at)| BackupInfo {
                path: self.backups_dir.join(&id),
                id,
                created_at,
            })
            .collect())
    }

    /// Replaces the persisted snapshot with the backup identified by `id`.
    ///
    /// The caller must reopen its [`super::LedgerStore`] afterwards.
    pub fn restore_backup(&self, id: &str) -> Result<TrackerSnapshot, StoreError> {
        let backup = self
            .list_backups()?
            .into_iter()
            .find(|info| info.id == id)
            .ok_or_else(|| {
                StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("backup `{id}` not found"),
                ))
            })?;
        let snapshot = load_snapshot_from_path(&backup.path)?;
        snapshot.check_constraints().map_err(|err| {
            StoreError::Serde(format!("backup `{id}` is inconsistent: {err}"))
        })?;
        self.persist(&snapshot)?;
        info!(backup = %id, "snapshot restored from backup");
        Ok(snapshot)
    }

    fn prune_backups(&self) -> Result<(), StoreError> {
        for stale in self.list_backups()?.into_iter().skip(self.retention) {
            debug!(backup = %stale.id, "pruning backup");
            fs::remove_file(&stale.path)?;
        }
        Ok(())
    }
}

impl SnapshotBackend for JsonBackend {
    fn load(&self) -> Result<TrackerSnapshot, StoreError> {
        if !self.snapshot_path.exists() {
            return Ok(TrackerSnapshot::default());
        }
        load_snapshot_from_path(&self.snapshot_path)
    }

    fn persist(&self, snapshot: &TrackerSnapshot) -> Result<(), StoreError> {
        write_atomic(&self.snapshot_path, &serialize_snapshot(snapshot)?)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.snapshot_path.display().to_string()
    }
}

/// Loads a snapshot from an arbitrary path.
pub fn load_snapshot_from_path(path: &Path) -> Result<TrackerSnapshot, StoreError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|err| StoreError::Serde(err.to_string()))
}

fn serialize_snapshot(snapshot: &TrackerSnapshot) -> Result<String, StoreError> {
    serde_json::to_string_pretty(snapshot).map_err(|err| StoreError::Serde(err.to_string()))
}
