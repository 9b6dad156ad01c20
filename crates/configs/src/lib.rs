use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::warn;

/// Databases the admin panel manages when no `[storage.databases]` table is given.
pub const DEFAULT_DATABASES: [&str; 7] =
    ["users", "cars", "chats", "admin", "payments", "global_races", "klans"];

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: Some(4) }
    }
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 5000 }

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Logical database name -> JSON file path.
    #[serde(default = "default_databases")]
    pub databases: BTreeMap<String, PathBuf>,
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            databases: default_databases(),
            backup_dir: default_backup_dir(),
            upload_dir: default_upload_dir(),
            static_dir: default_static_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_databases() -> BTreeMap<String, PathBuf> {
    DEFAULT_DATABASES
        .iter()
        .map(|name| (name.to_string(), PathBuf::from(format!("{name}.json"))))
        .collect()
}
fn default_backup_dir() -> PathBuf { PathBuf::from("backups") }
fn default_upload_dir() -> PathBuf { PathBuf::from("uploads") }
fn default_static_dir() -> PathBuf { PathBuf::from("static") }
fn default_max_upload_bytes() -> usize { 16 * 1024 * 1024 }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub admin_username: String,
    #[serde(default)]
    pub admin_password: String,
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_session_days")]
    pub session_days: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: String::new(),
            admin_password: String::new(),
            jwt_secret: String::new(),
            session_days: default_session_days(),
        }
    }
}

fn default_session_days() -> u32 { 7 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), apply env overrides and validate.
    /// A missing or unreadable config file falls back to built-in defaults.
    pub fn load_or_default() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(error = %e, "config file unavailable; using defaults");
                AppConfig::default()
            }
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize_from_env();
        self.server.normalize()?;
        self.storage.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.databases.is_empty() {
            return Err(anyhow!("storage.databases must name at least one database"));
        }
        for (name, path) in &self.databases {
            if name.trim().is_empty() {
                return Err(anyhow!("storage.databases contains an empty name"));
            }
            if path.as_os_str().is_empty() {
                return Err(anyhow!("storage.databases.{name} has an empty path"));
            }
        }
        if self.backup_dir.as_os_str().is_empty() {
            return Err(anyhow!("storage.backup_dir is empty"));
        }
        if self.max_upload_bytes == 0 {
            return Err(anyhow!("storage.max_upload_bytes must be > 0"));
        }
        Ok(())
    }
}

impl AuthConfig {
    /// Env wins over empty TOML values; built-in fallbacks last.
    pub fn normalize_from_env(&mut self) {
        if self.admin_username.trim().is_empty() {
            self.admin_username =
                std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        }
        if self.admin_password.is_empty() {
            self.admin_password =
                std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
        }
        if self.jwt_secret.is_empty() {
            self.jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
                warn!("JWT_SECRET not set; using development secret");
                "dev-secret-change-me".to_string()
            });
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.admin_username.trim().is_empty() {
            return Err(anyhow!("auth.admin_username is empty"));
        }
        if self.session_days == 0 {
            return Err(anyhow!("auth.session_days must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_original_databases() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.storage.databases.len(), DEFAULT_DATABASES.len());
        assert_eq!(cfg.storage.databases["klans"], PathBuf::from("klans.json"));
        assert_eq!(cfg.storage.backup_dir, PathBuf::from("backups"));
        assert_eq!(cfg.storage.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(cfg.auth.session_days, 7);
    }

    #[test]
    fn explicit_databases_replace_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [storage]
            backup_dir = "/var/lib/admin/backups"

            [storage.databases]
            users = "data/users.json"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.storage.databases.len(), 1);
        assert_eq!(cfg.storage.databases["users"], PathBuf::from("data/users.json"));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut storage = StorageConfig::default();
        storage.databases.insert(" ".into(), PathBuf::from("x.json"));
        assert!(storage.validate().is_err());

        let mut storage = StorageConfig::default();
        storage.databases.insert("empty".into(), PathBuf::new());
        assert!(storage.validate().is_err());

        let auth = AuthConfig { admin_username: "admin".into(), session_days: 0, ..AuthConfig::default() };
        assert!(auth.validate().is_err());

        let mut server = ServerConfig { port: 0, ..ServerConfig::default() };
        assert!(server.normalize().is_err());
    }

    #[test]
    fn load_from_file_reads_toml() -> Result<()> {
        let path = std::env::temp_dir().join(format!("configs_{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[auth]\nadmin_username = \"root\"\nsession_days = 1\n")?;
        let cfg = load_from_file(path.to_str().unwrap())?;
        assert_eq!(cfg.auth.admin_username, "root");
        assert_eq!(cfg.auth.session_days, 1);
        let _ = std::fs::remove_file(&path);
        Ok(())
    }
}
