use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Summaries of every database file present on disk
#[utoipa::path(get, path = "/api/databases", tag = "databases", responses((status = 200, description = "OK")))]
pub async fn list_databases(State(state): State<ServerState>) -> Json<Value> {
    let databases = state.store.list_databases().await;
    Json(json!({"success": true, "databases": databases}))
}

/// Full document. Unknown or unreadable databases read as `{}`.
#[utoipa::path(get, path = "/api/database/{db}", tag = "databases", params(("db" = String, Path, description = "Database name")), responses((status = 200, description = "OK")))]
pub async fn get_database(State(state): State<ServerState>, Path(db): Path<String>) -> Json<Value> {
    let data = state.store.load(&db).await;
    Json(json!({"success": true, "data": data}))
}

/// Replace the whole document
#[utoipa::path(put, path = "/api/database/{db}", tag = "databases", params(("db" = String, Path, description = "Database name")), responses((status = 200, description = "Saved"), (status = 400, description = "Body is not a JSON object"), (status = 404, description = "Unknown database")))]
pub async fn replace_database(
    State(state): State<ServerState>,
    Path(db): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(body) = payload?;
    let Value::Object(doc) = body else {
        return Err(JsonApiError::bad_request("database body must be a JSON object"));
    };
    let backup = state.store.save(&db, &doc).await?;
    Ok(Json(json!({
        "success": true,
        "message": "database updated",
        "backup_file": backup,
    })))
}

#[utoipa::path(get, path = "/api/search/{db}", tag = "databases", params(("db" = String, Path, description = "Database name"), ("q" = Option<String>, Query, description = "Case-insensitive substring")), responses((status = 200, description = "OK")))]
pub async fn search(
    State(state): State<ServerState>,
    Path(db): Path<String>,
    Query(params): Query<SearchParams>,
) -> Json<Value> {
    let found = state.store.search(&db, &params.q).await;
    Json(json!({"success": true, "results": found.results, "count": found.count}))
}
