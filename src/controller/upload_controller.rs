use std::sync::Arc;
use axum::{Extension, Json, Router};
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::response::IntoResponse;
use axum::routing::post;
use serde_json::Value;
use tracing::info;
use crate::controller::AppState;
use crate::errors::ServiceError;
use crate::helpers::json_body::JsonBody;
use crate::helpers::validation::FieldReader;
use crate::services::upload_coordinator::{UploadCoordinator, MAX_FILES_PER_UPLOAD};

const PHOTOS_FIELD: &str = "photos";

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/upload-by-link", post(upload_by_link))
        .route(
            "/upload",
            post(upload_photos).layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes)),
        )
        .route_layer(Extension(app_state.uploads))
}

pub async fn upload_by_link(
    Extension(uploads): Extension<Arc<UploadCoordinator>>,
    JsonBody(body): JsonBody,
) -> impl IntoResponse {
    info!("Upload-by-link endpoint called.");
    match store_from_link(&uploads, &body).await {
        Ok(file_id) => Json(file_id).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn store_from_link(uploads: &UploadCoordinator, body: &Value) -> Result<String, ServiceError> {
    let mut reader = FieldReader::new(body)?;
    let link = reader.required_string("link");
    reader.finish()?;

    uploads.from_remote_url(&link).await
}

pub async fn upload_photos(
    Extension(uploads): Extension<Arc<UploadCoordinator>>,
    multipart: Multipart,
) -> impl IntoResponse {
    info!("Upload endpoint called.");
    match store_photos(&uploads, multipart).await {
        Ok(file_ids) => Json(file_ids).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Reads every `photos` part before writing anything, so an oversized batch
/// leaves no files behind.
async fn store_photos(uploads: &UploadCoordinator, mut multipart: Multipart) -> Result<Vec<String>, ServiceError> {
    let mut photos = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::validation(PHOTOS_FIELD, e.to_string()))?
    {
        let is_photo = matches!(field.name(), Some(name) if name == PHOTOS_FIELD || name == "photos[]");
        if !is_photo {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::validation(PHOTOS_FIELD, e.to_string()))?;
        photos.push((original_name, bytes));

        if photos.len() > MAX_FILES_PER_UPLOAD {
            return Err(ServiceError::validation(
                PHOTOS_FIELD,
                format!("at most {} files per upload", MAX_FILES_PER_UPLOAD),
            ));
        }
    }

    let mut file_ids = Vec::with_capacity(photos.len());
    for (original_name, bytes) in photos {
        file_ids.push(uploads.from_bytes(&original_name, &bytes).await?);
    }

    Ok(file_ids)
}
