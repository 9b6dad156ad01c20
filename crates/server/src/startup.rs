use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use service::{
    auth::{service::SessionConfig, AuthService, StaticCredentials},
    runtime,
    storage::RecordStore,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Wire the record store and the admin credential check from configuration.
pub fn build_state(cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let creds = StaticCredentials::new(cfg.auth.admin_username.clone(), &cfg.auth.admin_password)
        .map_err(|e| StartupError::InvalidConfig(format!("admin credentials: {e}")))?;
    let auth = AuthService::new(
        Arc::new(creds),
        SessionConfig {
            jwt_secret: cfg.auth.jwt_secret.clone(),
            session_ttl: chrono::Duration::days(i64::from(cfg.auth.session_days)),
        },
    );
    let store = RecordStore::new(cfg.storage.databases.clone(), cfg.storage.backup_dir.clone());
    Ok(ServerState {
        store: Arc::new(store),
        auth,
        upload_dir: cfg.storage.upload_dir.clone(),
    })
}

/// Build the complete router for `cfg`.
pub fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let state = build_state(cfg)?;
    Ok(routes::build_router(
        state,
        build_cors(),
        &cfg.storage.static_dir,
        cfg.storage.max_upload_bytes,
    ))
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("server address: {e}")))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(event = "shutdown_signal", "received Ctrl+C, shutting down");
    }
}

/// Public entry: prepare directories, build the app and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    runtime::ensure_env(&cfg.storage.static_dir, &cfg.storage.backup_dir, &cfg.storage.upload_dir)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let app = build_app(&cfg)?;
    let addr = bind_addr(&cfg)?;
    info!(
        %addr,
        databases = cfg.storage.databases.len(),
        backup_dir = %cfg.storage.backup_dir.display(),
        "starting admin panel"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_rejects_garbage_host() {
        let mut cfg = AppConfig::default();
        cfg.server.host = "not a host".into();
        assert!(matches!(bind_addr(&cfg), Err(StartupError::InvalidConfig(_))));

        cfg.server.host = "127.0.0.1".into();
        assert_eq!(bind_addr(&cfg).unwrap().port(), cfg.server.port);
    }
}
