use std::sync::Arc;
use axum::{Extension, Json, Router};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};
use tracing::{debug, info};
use crate::config::Config;
use crate::controller::AppState;
use crate::errors::ServiceError;
use crate::helpers::json_body::JsonBody;
use crate::services::auth_guard::{authenticate, expired_session_cookie, session_cookie, session_token};
use crate::services::session_token::{SessionTokenService, TokenError};
use crate::services::user_service::UserService;

pub fn router(app_state: AppState) -> Router {
    let user_service = Arc::new(UserService::new(
        app_state.store.clone(),
        app_state.tokens.clone(),
    ));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
        .route("/logout", post(logout))
        .route_layer(Extension(user_service))
        .route_layer(Extension(app_state.tokens))
        .route_layer(Extension(app_state.config))
}

pub async fn register(
    Extension(user_service): Extension<Arc<UserService>>,
    JsonBody(body): JsonBody,
) -> impl IntoResponse {
    info!("Register endpoint called.");
    match user_service.register(&body).await {
        Ok(profile) => (StatusCode::CREATED, Json(profile)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn login(
    Extension(user_service): Extension<Arc<UserService>>,
    Extension(config): Extension<Arc<Config>>,
    jar: CookieJar,
    JsonBody(body): JsonBody,
) -> impl IntoResponse {
    info!("Login endpoint called.");
    match user_service.login(&body).await {
        Ok(outcome) => {
            let jar = jar.add(session_cookie(outcome.token, config.cookie_secure));
            (jar, Json(json!({ "message": "Logged in", "user": outcome.profile }))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// `null` when no session cookie is present at all; a bad cookie is a 401.
pub async fn profile(
    Extension(user_service): Extension<Arc<UserService>>,
    Extension(tokens): Extension<Arc<SessionTokenService>>,
    jar: CookieJar,
) -> impl IntoResponse {
    info!("Profile endpoint called.");
    let identity = match authenticate(&jar, &tokens) {
        Ok(identity) => identity,
        Err(ServiceError::Unauthorized(TokenError::Missing)) => {
            return Json(Value::Null).into_response();
        }
        Err(e) => return e.into_response(),
    };

    match user_service.profile(&identity).await {
        Ok(profile) => Json(profile).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Clears the cookie and revokes the token it carried, if that token was still valid.
pub async fn logout(
    Extension(tokens): Extension<Arc<SessionTokenService>>,
    jar: CookieJar,
) -> impl IntoResponse {
    info!("Logout endpoint called.");
    if let Some(token) = session_token(&jar) {
        if let Err(e) = tokens.revoke(&token) {
            debug!("Logout with an unusable session token: {}", e);
        }
    }

    (jar.remove(expired_session_cookie()), Json(true))
}
