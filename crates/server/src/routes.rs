use std::path::Path;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;

pub mod auth;
pub mod backups;
pub mod databases;
pub mod files;
pub mod records;

use crate::openapi::ApiDoc;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn api_docs() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router: public routes (health, login, static
/// assets) and the session-guarded `/api/*` routes.
pub fn build_router(
    state: auth::ServerState,
    cors: CorsLayer,
    static_dir: &Path,
    body_limit: usize,
) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .nest_service("/static", ServeDir::new(static_dir));

    let api = Router::new()
        .route("/api/databases", get(databases::list_databases))
        .route(
            "/api/database/:db",
            get(databases::get_database).put(databases::replace_database),
        )
        .route("/api/database/:db/record", post(records::add_record))
        .route(
            "/api/database/:db/record/:key",
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
        .route("/api/search/:db", get(databases::search))
        .route("/api/backup/:db", post(backups::create_backup))
        .route("/api/backups", get(backups::list_backups))
        .route("/api/restore/:db", post(backups::restore_backup))
        .route("/api/download/:db", get(files::download))
        .route("/api/upload", post(files::upload))
        .route("/api/docs", get(api_docs))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_session));

    public
        .merge(api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
