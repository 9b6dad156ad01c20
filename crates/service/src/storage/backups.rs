//! Backup file naming and discovery.
//!
//! Backups are plain JSON copies named `{db}_{YYYYMMDD_HHMMSS}.json`. The
//! timestamp has second resolution, so two backups of the same database in
//! the same second share a name and the later write wins.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::Serialize;
use tokio::fs;

use crate::errors::ServiceError;

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const STAMP_LEN: usize = 15;

/// One backup file found in the backup directory.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct BackupEntry {
    pub db_name: String,
    pub file_name: String,
    pub path: PathBuf,
    pub size: u64,
    pub created: String,
}

pub fn backup_file_name<Tz: TimeZone>(db_name: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}.json", db_name, at.format(STAMP_FORMAT))
}

/// Split `users_20240101_120000.json` into `("users", 2024-01-01 12:00:00)`.
/// Database names may themselves contain underscores (`global_races`).
pub fn parse_backup_file_name(file_name: &str) -> Option<(&str, NaiveDateTime)> {
    let stem = file_name.strip_suffix(".json")?;
    if stem.len() < STAMP_LEN + 2 || !stem.is_char_boundary(stem.len() - STAMP_LEN) {
        return None;
    }
    let (head, stamp) = stem.split_at(stem.len() - STAMP_LEN);
    let db_name = head.strip_suffix('_')?;
    if db_name.is_empty() {
        return None;
    }
    let created = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
    Some((db_name, created))
}

/// Write `bytes` as a fresh backup of `db_name`, creating the directory if needed.
pub(crate) async fn write_backup(
    backup_dir: &Path,
    db_name: &str,
    bytes: &[u8],
) -> Result<PathBuf, ServiceError> {
    fs::create_dir_all(backup_dir)
        .await
        .map_err(|e| ServiceError::io(backup_dir, e))?;
    let path = backup_dir.join(backup_file_name(db_name, &Local::now()));
    fs::write(&path, bytes).await.map_err(|e| ServiceError::io(&path, e))?;
    Ok(path)
}

/// Newest-first listing of backups, optionally limited to one database.
/// A missing backup directory is an empty listing.
pub(crate) async fn list_backups(
    backup_dir: &Path,
    db_name: Option<&str>,
) -> Result<Vec<BackupEntry>, ServiceError> {
    let mut dir = match fs::read_dir(backup_dir).await {
        Ok(dir) => dir,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ServiceError::io(backup_dir, e)),
    };

    let mut found: Vec<(NaiveDateTime, BackupEntry)> = Vec::new();
    while let Some(entry) = dir.next_entry().await.map_err(|e| ServiceError::io(backup_dir, e))? {
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let Some((name, created)) = parse_backup_file_name(&file_name) else { continue };
        if db_name.is_some_and(|wanted| wanted != name) {
            continue;
        }
        let meta = match entry.metadata().await {
            Ok(meta) if meta.is_file() => meta,
            _ => continue,
        };
        found.push((
            created,
            BackupEntry {
                db_name: name.to_string(),
                file_name: file_name.clone(),
                path: entry.path(),
                size: meta.len(),
                created: created.format("%Y-%m-%d %H:%M:%S").to_string(),
            },
        ));
    }

    found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.file_name.cmp(&a.1.file_name)));
    Ok(found.into_iter().map(|(_, entry)| entry).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_uses_second_resolution_stamp() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(backup_file_name("users", &at), "users_20240309_070501.json");
    }

    #[test]
    fn parse_handles_underscored_names() {
        let (name, created) = parse_backup_file_name("global_races_20240309_070501.json").unwrap();
        assert_eq!(name, "global_races");
        assert_eq!(created.format(STAMP_FORMAT).to_string(), "20240309_070501");
    }

    #[test]
    fn parse_rejects_foreign_files() {
        assert!(parse_backup_file_name("users.json").is_none());
        assert!(parse_backup_file_name("users_2024.json").is_none());
        assert!(parse_backup_file_name("_20240309_070501.json").is_none());
        assert!(parse_backup_file_name("users_20241399_070501.json").is_none());
        assert!(parse_backup_file_name("users_20240309_070501.txt").is_none());
    }

    #[tokio::test]
    async fn listing_filters_and_orders_newest_first() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("backups_list_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).await?;
        for name in [
            "users_20240101_000000.json",
            "users_20240301_000000.json",
            "cars_20240201_000000.json",
            "notes.txt",
        ] {
            fs::write(dir.join(name), b"{}").await?;
        }

        let all = list_backups(&dir, None).await?;
        let names: Vec<_> = all.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(
            names,
            ["users_20240301_000000.json", "cars_20240201_000000.json", "users_20240101_000000.json"]
        );

        let users = list_backups(&dir, Some("users")).await?;
        assert_eq!(users.len(), 2);
        assert!(users.iter().all(|e| e.db_name == "users" && e.size == 2));
        assert_eq!(users[0].created, "2024-03-01 00:00:00");

        let missing = list_backups(&dir.join("nope"), None).await?;
        assert!(missing.is_empty());

        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
