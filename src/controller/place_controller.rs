use std::sync::Arc;
use axum::{Extension, Json, Router};
use axum::extract::Path;
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::Value;
use tracing::{info, warn};
use crate::controller::AppState;
use crate::errors::ServiceError;
use crate::helpers::json_body::JsonBody;
use crate::helpers::validation::FieldReader;
use crate::services::place_service::PlaceService;
use crate::services::session_token::Identity;

pub fn router(app_state: AppState) -> Router {
    let place_service = Arc::new(PlaceService::new(app_state.store.clone()));

    Router::new()
        .route("/places", get(list_places).post(create_place).put(update_place))
        .route("/places/:id", get(retrieve_place))
        .route("/user-places", get(list_user_places))
        .route_layer(Extension(place_service))
        .route_layer(Extension(app_state.tokens))
}

pub async fn create_place(
    identity: Identity,
    Extension(place_service): Extension<Arc<PlaceService>>,
    JsonBody(body): JsonBody,
) -> impl IntoResponse {
    info!("Places endpoint called.");
    match place_service.create(&identity, &body).await {
        Ok(place) => Json(place).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_place(
    identity: Identity,
    Extension(place_service): Extension<Arc<PlaceService>>,
    JsonBody(body): JsonBody,
) -> impl IntoResponse {
    info!("Put places endpoint called.");
    let place_id = match read_place_id(&body) {
        Ok(place_id) => place_id,
        Err(e) => return e.into_response(),
    };

    match place_service.update(&identity, &place_id, &body).await {
        Ok(_) => Json("ok").into_response(),
        Err(ServiceError::Forbidden) => {
            warn!("User {} attempted to modify place {} they do not own", identity.user_id, place_id);
            ServiceError::Forbidden.into_response()
        }
        Err(e) => e.into_response(),
    }
}

fn read_place_id(body: &Value) -> Result<String, ServiceError> {
    let mut reader = FieldReader::new(body)?;
    let place_id = reader.required_string("id");
    reader.finish()?;
    Ok(place_id)
}

pub async fn list_places(
    Extension(place_service): Extension<Arc<PlaceService>>,
) -> impl IntoResponse {
    info!("Get places endpoint called.");
    match place_service.list_all().await {
        Ok(places) => Json(places).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Answers `null` for an unknown id.
pub async fn retrieve_place(
    Extension(place_service): Extension<Arc<PlaceService>>,
    Path(place_id): Path<String>,
) -> impl IntoResponse {
    info!("Places:id endpoint called.");
    match place_service.get_by_id(&place_id).await {
        Ok(place) => Json(Some(place)).into_response(),
        Err(ServiceError::NotFound(_)) => Json(Value::Null).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_user_places(
    identity: Identity,
    Extension(place_service): Extension<Arc<PlaceService>>,
) -> impl IntoResponse {
    info!("User-places endpoint called.");
    match place_service.list_by_owner(&identity).await {
        Ok(places) => Json(places).into_response(),
        Err(e) => e.into_response(),
    }
}
