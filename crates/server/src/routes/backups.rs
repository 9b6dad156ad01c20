use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

#[derive(Debug, Deserialize)]
pub struct BackupFilter {
    pub db: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub backup_file: String,
}

#[utoipa::path(post, path = "/api/backup/{db}", tag = "backups", params(("db" = String, Path, description = "Database name")), responses((status = 200, description = "Backup written"), (status = 404, description = "Unknown database")))]
pub async fn create_backup(
    State(state): State<ServerState>,
    Path(db): Path<String>,
) -> Result<Json<Value>, JsonApiError> {
    let path = state.store.backup(&db).await?;
    Ok(Json(json!({"success": true, "backup_file": path})))
}

#[utoipa::path(get, path = "/api/backups", tag = "backups", params(("db" = Option<String>, Query, description = "Only backups of this database")), responses((status = 200, description = "OK"), (status = 404, description = "Unknown database")))]
pub async fn list_backups(
    State(state): State<ServerState>,
    Query(filter): Query<BackupFilter>,
) -> Result<Json<Value>, JsonApiError> {
    let backups = state.store.list_backups(filter.db.as_deref()).await?;
    Ok(Json(json!({"success": true, "count": backups.len(), "backups": backups})))
}

/// Restore from a file in the backup directory. Only the last component of
/// `backup_file` is used, so paths outside the backup directory are never read.
#[utoipa::path(post, path = "/api/restore/{db}", tag = "backups", params(("db" = String, Path, description = "Database name")), request_body = crate::openapi::RestoreRequestDoc, responses((status = 200, description = "Restored"), (status = 400, description = "Missing or invalid backup_file"), (status = 404, description = "Backup file or database not found")))]
pub async fn restore_backup(
    State(state): State<ServerState>,
    Path(db): Path<String>,
    payload: Result<Json<RestoreRequest>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(req) = payload?;
    let file_name = std::path::Path::new(req.backup_file.trim())
        .file_name()
        .ok_or_else(|| JsonApiError::bad_request("backup_file is required"))?;
    let source = state.store.backup_dir().join(file_name);
    let backup = state.store.restore(&db, &source).await?;
    Ok(Json(json!({
        "success": true,
        "message": "database restored",
        "backup_file": backup,
    })))
}
