//! Filesystem helpers shared by the snapshot and config stores.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

const TMP_SUFFIX: &str = "tmp";

/// Timestamp segment embedded in backup file names, down to the millisecond.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%.3f";

/// Writes `data` to a sibling temp file, syncs it, then renames it over `path`.
pub fn write_atomic(path: &Path, data: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(data.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)
}

pub fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Lowercase, dash-separated label safe for use in a file name.
pub fn slug_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut slug = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !slug.is_empty() && !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let trimmed = slug.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `<prefix>_<timestamp>[_<note>].json`
pub fn backup_file_name(prefix: &str, at: DateTime<Utc>, note: Option<&str>) -> String {
    let mut stem = format!("{prefix}_{}", at.format(BACKUP_TIMESTAMP_FORMAT));
    if let Some(label) = slug_note(note) {
        stem.push('_');
        stem.push_str(&label);
    }
    format!("{stem}.json")
}

/// Names the next backup in `dir`. The timestamp is moved past the newest
/// existing backup so names stay unique and sort in creation order even when
/// several backups land in the same millisecond.
pub fn unused_backup_name(
    dir: &Path,
    prefix: &str,
    at: DateTime<Utc>,
    note: Option<&str>,
) -> io::Result<(String, DateTime<Utc>)> {
    let newest = list_backup_files(dir, prefix)?
        .into_iter()
        .filter_map(|(_, created_at)| created_at)
        .max();
    let mut at = match newest {
        Some(newest) if newest >= at => newest + Duration::milliseconds(1),
        _ => at,
    };
    loop {
        let name = backup_file_name(prefix, at, note);
        if !dir.join(&name).exists() {
            return Ok((name, at));
        }
        at += Duration::milliseconds(1);
    }
}

/// Recovers the timestamp from a name produced by [`backup_file_name`].
/// Names written before millisecond precision (`HHMMSS` only) still parse.
pub fn parse_backup_timestamp(prefix: &str, name: &str) -> Option<DateTime<Utc>> {
    let rest = name
        .strip_suffix(".json")?
        .strip_prefix(prefix)?
        .strip_prefix('_')?;
    let mut segments = rest.splitn(3, '_');
    let date = segments.next()?;
    let time_segment = segments.next()?;
    let (time, millis) = match time_segment.split_once('.') {
        Some((time, millis)) if is_digits(millis, 3) => (time, millis.parse::<i64>().ok()?),
        Some(_) => return None,
        None => (time_segment, 0),
    };
    if !is_digits(date, 8) || !is_digits(time, 6) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc) + Duration::milliseconds(millis))
}

/// JSON files in `dir` matching `prefix`, newest first.
pub fn list_backup_files(dir: &Path, prefix: &str) -> io::Result<Vec<(String, Option<DateTime<Utc>>)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            if name.starts_with(prefix) {
                entries.push((name.to_string(), parse_backup_timestamp(prefix, name)));
            }
        }
    }
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
    Ok(entries)
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}
