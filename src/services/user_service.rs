use std::sync::Arc;
use serde_json::Value;
use tracing::info;
use crate::errors::ServiceError;
use crate::helpers::validation::FieldReader;
use crate::models::user::{User, UserProfile};
use crate::repositories::Store;
use crate::services::session_token::{Identity, SessionTokenService};
use crate::services::{credential_store, new_record_id};

pub struct UserService {
    store: Arc<dyn Store>,
    tokens: Arc<SessionTokenService>,
}

/// A successful login: the session token to hand back plus who it belongs to.
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub profile: UserProfile,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<SessionTokenService>) -> Self {
        Self { store, tokens }
    }

    /// Creates an account. Email uniqueness is checked up front for a clean
    /// error, and enforced for real by the store's unique constraint.
    pub async fn register(&self, body: &Value) -> Result<UserProfile, ServiceError> {
        let mut reader = FieldReader::new(body)?;
        let name = reader.required_string("name");
        let email = reader.required_email("email");
        let password = reader.required_string("password");
        reader.finish()?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict(format!("{} is already registered", email)));
        }

        let user = User {
            id: new_record_id(),
            name,
            email,
            password_hash: credential_store::hash(&password)?,
        };
        self.store.insert_user(&user).await?;
        info!("Registered user {}", user.id);

        Ok(UserProfile::from(&user))
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, body: &Value) -> Result<LoginOutcome, ServiceError> {
        let mut reader = FieldReader::new(body)?;
        let email = reader.required_string("email");
        let password = reader.required_string("password");
        reader.finish()?;

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !credential_store::verify(&password, &user.password_hash)? {
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.id, &user.email)?;
        Ok(LoginOutcome {
            token,
            profile: UserProfile::from(&user),
        })
    }

    pub async fn profile(&self, identity: &Identity) -> Result<Option<UserProfile>, ServiceError> {
        let user = self.store.find_user_by_id(&identity.user_id).await?;
        Ok(user.as_ref().map(UserProfile::from))
    }
}
