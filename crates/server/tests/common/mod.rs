#![allow(dead_code)]

use std::path::{Path, PathBuf};

use configs::AppConfig;
use uuid::Uuid;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Isolated on-disk layout for one test; removed on drop.
pub struct TestDir {
    pub root: PathBuf,
}

impl TestDir {
    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!("json_admin_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root).expect("create test dir");
        Self { root }
    }

    pub fn db_path(&self, db: &str) -> PathBuf {
        self.root.join(format!("{db}.json"))
    }

    pub fn config(&self) -> AppConfig {
        config_for(&self.root)
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

pub fn config_for(root: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.storage.databases = ["users", "cars"]
        .iter()
        .map(|name| (name.to_string(), root.join(format!("{name}.json"))))
        .collect();
    cfg.storage.backup_dir = root.join("backups");
    cfg.storage.upload_dir = root.join("uploads");
    cfg.storage.static_dir = root.join("static");
    cfg.auth.admin_username = ADMIN_USER.into();
    cfg.auth.admin_password = ADMIN_PASSWORD.into();
    cfg.auth.jwt_secret = "test-secret".into();
    cfg
}
