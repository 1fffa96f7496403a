pub mod auth_guard;
pub mod booking_service;
pub mod credential_store;
pub mod place_service;
pub mod session_token;
pub mod upload_coordinator;
pub mod user_service;

/// Fresh opaque identifier for a stored record.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
