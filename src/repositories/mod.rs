use async_trait::async_trait;
use crate::models::booking::Booking;
use crate::models::place::Place;
use crate::models::user::User;

pub mod memory_repo;
pub mod postgres_repo;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the field name.
    #[error("duplicate value for {0}")]
    Duplicate(&'static str),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Document-style persistence for the three entity types. Individual calls are
/// atomic; multi-step flows are not.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn insert_place(&self, place: &Place) -> StoreResult<()>;

    async fn find_place(&self, id: &str) -> StoreResult<Option<Place>>;

    async fn list_places(&self) -> StoreResult<Vec<Place>>;

    async fn list_places_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Place>>;

    /// Overwrites the place only if its stored owner is still `owner_id`.
    /// Returns whether a row was written.
    async fn update_place_if_owner(&self, place: &Place, owner_id: &str) -> StoreResult<bool>;

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()>;

    async fn find_booking(&self, id: &str) -> StoreResult<Option<Booking>>;

    async fn list_bookings_by_user(&self, user_id: &str) -> StoreResult<Vec<Booking>>;
}
