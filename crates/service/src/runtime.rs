//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so the server crate prepares its
//! directories through the service layer that owns them.

use std::path::Path;

/// Warn on a missing static directory; create the backup and upload directories.
pub async fn ensure_env(static_dir: &Path, backup_dir: &Path, upload_dir: &Path) -> anyhow::Result<()> {
    let static_dir = static_dir.to_string_lossy();
    let backup_dir = backup_dir.to_string_lossy();
    let upload_dir = upload_dir.to_string_lossy();
    common::env::ensure_env(&static_dir, &[&*backup_dir, &*upload_dir]).await
}
