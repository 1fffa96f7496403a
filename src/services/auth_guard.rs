use std::sync::Arc;
use anyhow::anyhow;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use crate::errors::ServiceError;
use crate::services::session_token::{Identity, SessionTokenService, TokenError, TOKEN_TTL_SECONDS};

pub const SESSION_COOKIE: &str = "token";

/// Reads the session cookie and verifies it. Any token problem becomes
/// `ServiceError::Unauthorized`.
pub fn authenticate(jar: &CookieJar, tokens: &SessionTokenService) -> Result<Identity, ServiceError> {
    let token = session_token(jar).ok_or(TokenError::Missing)?;
    Ok(tokens.verify(&token)?)
}

pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

pub fn authorize_owner(identity: &Identity, resource_owner_id: &str) -> bool {
    identity.user_id == resource_owner_id
}

pub fn ensure_owner(identity: &Identity, resource_owner_id: &str) -> Result<(), ServiceError> {
    if authorize_owner(identity, resource_owner_id) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(TOKEN_TTL_SECONDS))
        .finish()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "").path("/").finish()
}

/// Extractor for handlers that require a signed-in caller. Needs the
/// `SessionTokenService` installed as a request extension.
#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tokens = parts
            .extensions
            .get::<Arc<SessionTokenService>>()
            .cloned()
            .ok_or_else(|| ServiceError::Internal(anyhow!("session token service is not installed on this route")))?;

        let jar = CookieJar::from_headers(&parts.headers);
        authenticate(&jar, &tokens)
    }
}
