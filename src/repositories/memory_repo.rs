use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::models::booking::Booking;
use crate::models::place::Place;
use crate::models::user::User;
use crate::repositories::{Store, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    places: Vec<Place>,
    bookings: Vec<Booking>,
}

/// Process-local store. Rows are kept in insertion order so listings are stable.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }
        if tables.users.iter().any(|u| u.id == user.id) {
            return Err(StoreError::Duplicate("id"));
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_place(&self, place: &Place) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.places.iter().any(|p| p.id == place.id) {
            return Err(StoreError::Duplicate("id"));
        }
        tables.places.push(place.clone());
        Ok(())
    }

    async fn find_place(&self, id: &str) -> StoreResult<Option<Place>> {
        let tables = self.tables.read().await;
        Ok(tables.places.iter().find(|p| p.id == id).cloned())
    }

    async fn list_places(&self) -> StoreResult<Vec<Place>> {
        Ok(self.tables.read().await.places.clone())
    }

    async fn list_places_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Place>> {
        let tables = self.tables.read().await;
        Ok(tables
            .places
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn update_place_if_owner(&self, place: &Place, owner_id: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .places
            .iter_mut()
            .find(|p| p.id == place.id && p.owner_id == owner_id)
        {
            Some(stored) => {
                let owner = stored.owner_id.clone();
                *stored = place.clone();
                stored.owner_id = owner;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.bookings.iter().any(|b| b.id == booking.id) {
            return Err(StoreError::Duplicate("id"));
        }
        tables.bookings.push(booking.clone());
        Ok(())
    }

    async fn find_booking(&self, id: &str) -> StoreResult<Option<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn list_bookings_by_user(&self, user_id: &str) -> StoreResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }
}
