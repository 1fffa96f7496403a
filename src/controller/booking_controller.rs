use std::sync::Arc;
use axum::{Extension, Json, Router};
use axum::extract::Path;
use axum::response::IntoResponse;
use axum::routing::get;
use tracing::{info, warn};
use crate::controller::AppState;
use crate::errors::ServiceError;
use crate::helpers::json_body::JsonBody;
use crate::services::booking_service::BookingService;
use crate::services::session_token::Identity;

pub fn router(app_state: AppState) -> Router {
    let booking_service = Arc::new(BookingService::new(app_state.store.clone()));

    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/:id", get(retrieve_booking))
        .route_layer(Extension(booking_service))
        .route_layer(Extension(app_state.tokens))
}

pub async fn create_booking(
    identity: Identity,
    Extension(booking_service): Extension<Arc<BookingService>>,
    JsonBody(body): JsonBody,
) -> impl IntoResponse {
    info!("Post bookings endpoint called.");
    match booking_service.create(&identity, &body).await {
        Ok(booking) => Json(booking).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_bookings(
    identity: Identity,
    Extension(booking_service): Extension<Arc<BookingService>>,
) -> impl IntoResponse {
    info!("Get bookings endpoint called.");
    match booking_service.list_mine(&identity).await {
        Ok(bookings) => Json(bookings).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn retrieve_booking(
    identity: Identity,
    Extension(booking_service): Extension<Arc<BookingService>>,
    Path(booking_id): Path<String>,
) -> impl IntoResponse {
    info!("Get bookings:id endpoint called.");
    match booking_service.get_by_id(&identity, &booking_id).await {
        Ok(booking) => Json(booking).into_response(),
        Err(ServiceError::Forbidden) => {
            warn!("User {} attempted to read booking {} they do not own", identity.user_id, booking_id);
            ServiceError::Forbidden.into_response()
        }
        Err(e) => e.into_response(),
    }
}
