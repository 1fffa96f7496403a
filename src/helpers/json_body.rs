use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::Request;
use axum::Json;
use serde_json::Value;
use crate::errors::ServiceError;

/// A JSON request body whose rejections (bad syntax, wrong content type)
/// surface as `validation_error` in the usual error envelope.
pub struct JsonBody(pub Value);

#[async_trait]
impl<S, B> FromRequest<S, B> for JsonBody
where
    Json<Value>: FromRequest<S, B, Rejection = JsonRejection>,
    S: Send + Sync,
    B: Send + 'static,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(body)) => Ok(Self(body)),
            Err(rejection) => Err(ServiceError::validation("body", rejection.body_text())),
        }
    }
}
