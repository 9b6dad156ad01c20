use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

/// Database file as an attachment named `{db}.json`
#[utoipa::path(get, path = "/api/download/{db}", tag = "files", params(("db" = String, Path, description = "Database name")), responses((status = 200, description = "File contents"), (status = 404, description = "Not found")))]
pub async fn download(
    State(state): State<ServerState>,
    Path(db): Path<String>,
) -> Result<Response, JsonApiError> {
    let bytes = state.store.read_raw(&db).await?;
    let disposition = format!("attachment; filename=\"{db}.json\"");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Multipart upload: `file` (a `.json` file) and `db_name`. The file is kept in
/// the upload directory and its content replaces the named database.
#[utoipa::path(post, path = "/api/upload", tag = "files", responses((status = 200, description = "Imported"), (status = 400, description = "Missing file, bad name or unknown database")))]
pub async fn upload(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, JsonApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut db_name = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| JsonApiError::bad_request(e.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| JsonApiError::bad_request(e.to_string()))?;
                file = Some((name, data.to_vec()));
            }
            "db_name" => {
                db_name = field.text().await.map_err(|e| JsonApiError::bad_request(e.to_string()))?;
            }
            _ => {}
        }
    }

    let (original_name, data) = match file {
        Some((name, data)) if !name.is_empty() => (name, data),
        _ => return Err(JsonApiError::bad_request("no file selected")),
    };
    if !original_name.ends_with(".json") {
        return Err(JsonApiError::bad_request("invalid file format; expected .json"));
    }
    let file_name = sanitize_json_filename(&original_name)
        .ok_or_else(|| JsonApiError::bad_request("invalid file name"))?;
    let db_name = db_name.trim();
    if state.store.resolve(db_name).is_err() {
        return Err(JsonApiError::bad_request(format!("unknown database: {db_name}")));
    }

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let saved = state.upload_dir.join(&file_name);
    tokio::fs::write(&saved, &data)
        .await
        .map_err(|e| JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let backup = state.store.import_file(db_name, &saved).await?;
    info!(db = %db_name, file = %file_name, bytes = data.len(), "database uploaded");
    Ok(Json(json!({
        "success": true,
        "message": "database uploaded",
        "backup_file": backup,
    })))
}

/// Reduce an uploaded `.json` name to a safe single path component: the stem
/// keeps `[A-Za-z0-9._-]`, whitespace becomes `_`, leading dots and
/// underscores go. `None` when nothing usable is left.
pub fn sanitize_json_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let stem = base.strip_suffix(".json")?;
    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']);
    if cleaned.is_empty() {
        None
    } else {
        Some(format!("{cleaned}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_directories_and_odd_chars() {
        assert_eq!(sanitize_json_filename("users.json").as_deref(), Some("users.json"));
        assert_eq!(sanitize_json_filename("../../etc/passwd.json").as_deref(), Some("passwd.json"));
        assert_eq!(sanitize_json_filename("C:\\tmp\\my cars.json").as_deref(), Some("my_cars.json"));
        assert_eq!(sanitize_json_filename("..hidden.json").as_deref(), Some("hidden.json"));
        assert_eq!(sanitize_json_filename("данные.json"), None);
        assert_eq!(sanitize_json_filename("../"), None);
        assert_eq!(sanitize_json_filename("notes.txt"), None);
    }
}
