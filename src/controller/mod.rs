use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use axum::http::header::{
    CONTENT_SECURITY_POLICY, CONTENT_TYPE, COOKIE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
    X_FRAME_OPTIONS,
};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use crate::config::Config;
use crate::helpers::handler_404::page_not_found_handler;
use crate::repositories::Store;
use crate::services::session_token::SessionTokenService;
use crate::services::upload_coordinator::UploadCoordinator;

pub mod auth_controller;
pub mod booking_controller;
pub mod health_check;
pub mod place_controller;
pub mod upload_controller;

const CONTENT_SECURITY: &str = "default-src 'self'; script-src 'self'; style-src 'self'";

#[cfg(test)]
mod tests;

/// Process-wide collaborators, built once at startup and shared read-only.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn Store>,
    pub tokens: Arc<SessionTokenService>,
    pub uploads: Arc<UploadCoordinator>,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Arc<dyn Store>) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            tokens: Arc::new(SessionTokenService::new(config.jwt_secret.as_bytes())),
            uploads: Arc::new(UploadCoordinator::new(
                config.upload_dir.clone(),
                http_client,
                config.max_remote_fetch_bytes,
            )),
            config,
            store,
        })
    }
}

pub async fn serve(app_state: AppState) -> anyhow::Result<()> {
    let origins = app_state
        .config
        .origin_urls
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<HeaderValue>().with_context(|| format!("Invalid CORS origin: {}", s)))
        .collect::<anyhow::Result<Vec<HeaderValue>>>()?;

    app_state.uploads.ensure_upload_dir().await?;

    let application = router_endpoints(app_state.clone())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::OPTIONS
                        ])
                        .allow_origin(origins)
                        .allow_headers([CONTENT_TYPE, COOKIE])
                        .allow_credentials(true)
                )
        );

    let port = SocketAddr::from(([0, 0, 0, 0], app_state.config.port));
    info!("API server listening on port: {}", port);
    axum::Server::bind(&port)
        .serve(application.into_make_service())
        .await
        .context("Error spinning up the API server")
}

pub fn router_endpoints(app_state: AppState) -> Router {
    let upload_root = ServeDir::new(app_state.uploads.upload_dir());

    health_check::router()
        .merge(auth_controller::router(app_state.clone()))
        .merge(upload_controller::router(app_state.clone()))
        .merge(place_controller::router(app_state.clone()))
        .merge(booking_controller::router(app_state))
        .nest_service("/uploads", upload_root)
        .fallback(page_not_found_handler)
        .layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static(CONTENT_SECURITY),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    X_FRAME_OPTIONS,
                    HeaderValue::from_static("SAMEORIGIN"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    REFERRER_POLICY,
                    HeaderValue::from_static("no-referrer"),
                ))
        )
}
