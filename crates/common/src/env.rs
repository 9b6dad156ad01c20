//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::{debug, warn};

/// Warn when the static asset directory is missing and create every
/// writable directory the process needs (backups, uploads).
pub async fn ensure_env(static_dir: &str, writable_dirs: &[&str]) -> anyhow::Result<()> {
    if tokio::fs::metadata(static_dir).await.is_err() {
        warn!(%static_dir, "static assets directory not found; static assets may 404");
    }
    for dir in writable_dirs {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create {dir}: {e}"))?;
        debug!(%dir, "directory ready");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_env_creates_writable_dirs() -> anyhow::Result<()> {
        let root = std::env::temp_dir().join(format!("common_env_{}", uuid::Uuid::new_v4()));
        let backups = root.join("backups");
        let uploads = root.join("uploads");
        let missing_static = root.join("static");

        ensure_env(
            missing_static.to_str().unwrap(),
            &[backups.to_str().unwrap(), uploads.to_str().unwrap()],
        )
        .await?;

        assert!(backups.is_dir());
        assert!(uploads.is_dir());
        assert!(!missing_static.exists());

        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }
}
