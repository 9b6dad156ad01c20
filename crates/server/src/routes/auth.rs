use std::{path::PathBuf, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use service::{
    auth::{domain::LoginInput, AuthService},
    storage::RecordStore,
};

use crate::errors::JsonApiError;

pub const SESSION_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<RecordStore>,
    pub auth: AuthService,
    pub upload_dir: PathBuf,
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in; auth_token cookie set"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<(CookieJar, Json<serde_json::Value>), JsonApiError> {
    let Json(input) = payload?;
    let session = state.auth.login(input).await?;

    let mut cookie = Cookie::new(SESSION_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);

    Ok((
        jar,
        Json(json!({
            "success": true,
            "user": session.user,
            "token": session.token,
            "expires_at": session.expires_at,
        })),
    ))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

/// Guard for `/api/*`: accepts `Authorization: Bearer <token>` or the
/// `auth_token` cookie. Missing, malformed, invalid or expired tokens get 401.
/// Verified claims are stored in the request extensions.
pub async fn require_session(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    let token = match req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(t) => Some(t.trim().to_string()),
            None => {
                tracing::warn!(%path, "invalid Authorization format (expect Bearer)");
                return unauthorized("invalid Authorization header");
            }
        },
        None => jar.get(SESSION_COOKIE).map(|c| c.value().to_string()),
    };

    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => {
            tracing::warn!(%path, "missing Authorization header and auth_token cookie");
            return unauthorized("authentication required");
        }
    };

    match state.auth.verify_token(&token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            tracing::warn!(%path, error = %e, "session token rejected");
            unauthorized("invalid or expired session")
        }
    }
}

fn unauthorized(message: &str) -> Response {
    JsonApiError::new(StatusCode::UNAUTHORIZED, message).into_response()
}
