use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

/// Add a record; a `"key"` field in the body names it, otherwise a UUID is generated
#[utoipa::path(post, path = "/api/database/{db}/record", tag = "records", params(("db" = String, Path, description = "Database name")), responses((status = 200, description = "Added"), (status = 404, description = "Unknown database")))]
pub async fn add_record(
    State(state): State<ServerState>,
    Path(db): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(record) = payload?;
    let key = state.store.add_record(&db, record, None).await?;
    Ok(Json(json!({"success": true, "key": key, "message": "record added"})))
}

#[utoipa::path(get, path = "/api/database/{db}/record/{key}", tag = "records", params(("db" = String, Path, description = "Database name"), ("key" = String, Path, description = "Record key")), responses((status = 200, description = "OK"), (status = 404, description = "Not found")))]
pub async fn get_record(
    State(state): State<ServerState>,
    Path((db, key)): Path<(String, String)>,
) -> Result<Json<Value>, JsonApiError> {
    let record = state.store.get_record(&db, &key).await?;
    Ok(Json(json!({"success": true, "key": key, "record": record})))
}

/// Shallow-merge the body's fields into the record
#[utoipa::path(put, path = "/api/database/{db}/record/{key}", tag = "records", params(("db" = String, Path, description = "Database name"), ("key" = String, Path, description = "Record key")), responses((status = 200, description = "Updated"), (status = 400, description = "Bad Request"), (status = 404, description = "Not found")))]
pub async fn update_record(
    State(state): State<ServerState>,
    Path((db, key)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(updates) = payload?;
    let record = state.store.update_record(&db, &key, updates).await?;
    Ok(Json(json!({"success": true, "record": record, "message": "record updated"})))
}

#[utoipa::path(delete, path = "/api/database/{db}/record/{key}", tag = "records", params(("db" = String, Path, description = "Database name"), ("key" = String, Path, description = "Record key")), responses((status = 200, description = "Deleted"), (status = 404, description = "Not found")))]
pub async fn delete_record(
    State(state): State<ServerState>,
    Path((db, key)): Path<(String, String)>,
) -> Result<Json<Value>, JsonApiError> {
    state.store.delete_record(&db, &key).await?;
    Ok(Json(json!({"success": true, "message": "record deleted"})))
}
