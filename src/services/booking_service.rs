use std::sync::Arc;
use futures::future::try_join_all;
use serde_json::Value;
use tracing::info;
use crate::errors::ServiceError;
use crate::helpers::validation::FieldReader;
use crate::models::booking::{Booking, BookingDraft, BookingWithPlace};
use crate::repositories::Store;
use crate::services::auth_guard::ensure_owner;
use crate::services::new_record_id;
use crate::services::session_token::Identity;

pub struct BookingService {
    store: Arc<dyn Store>,
}

impl BookingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// The referenced place is not checked for existence.
    pub async fn create(&self, identity: &Identity, body: &Value) -> Result<Booking, ServiceError> {
        let draft = parse_draft(body)?;
        let booking = Booking::from_draft(new_record_id(), identity.user_id.clone(), draft);
        self.store.insert_booking(&booking).await?;
        info!("User {} booked place {} as {}", identity.user_id, booking.place_id, booking.id);

        Ok(booking)
    }

    pub async fn list_by_owner(&self, identity: &Identity) -> Result<Vec<Booking>, ServiceError> {
        Ok(self.store.list_bookings_by_user(&identity.user_id).await?)
    }

    /// The caller's bookings, each joined with its place. A dangling place
    /// reference yields `place: None` for that booking only.
    pub async fn list_mine(&self, identity: &Identity) -> Result<Vec<BookingWithPlace>, ServiceError> {
        let bookings = self.list_by_owner(identity).await?;
        let joined = bookings.into_iter().map(|booking| self.with_place(booking));

        try_join_all(joined).await
    }

    pub async fn get_by_id(&self, identity: &Identity, id: &str) -> Result<BookingWithPlace, ServiceError> {
        let booking = self
            .store
            .find_booking(id)
            .await?
            .ok_or(ServiceError::NotFound("booking"))?;
        ensure_owner(identity, &booking.user_id)?;

        self.with_place(booking).await
    }

    async fn with_place(&self, booking: Booking) -> Result<BookingWithPlace, ServiceError> {
        let place = self.store.find_place(&booking.place_id).await?;
        Ok(BookingWithPlace { booking, place })
    }
}

fn parse_draft(body: &Value) -> Result<BookingDraft, ServiceError> {
    let mut reader = FieldReader::new(body)?;
    let place_id = reader.required_string("place");
    let check_in = reader.required_date("checkIn");
    let check_out = reader.required_date("checkOut");
    let number_of_guests = reader.required_integer("numberOfGuests", 1);
    let guest_name = reader.required_string("name");
    let guest_phone = reader.required_string("phone");
    let price = reader.required_price("price");

    if reader.is_valid("checkIn") && reader.is_valid("checkOut") && check_out <= check_in {
        reader.push("checkOut", "must be after checkIn");
    }
    reader.finish()?;

    Ok(BookingDraft {
        place_id,
        check_in,
        check_out,
        number_of_guests,
        guest_name,
        guest_phone,
        price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::models::place::Place;
    use crate::repositories::memory_repo::MemoryStore;

    fn identity(user_id: &str) -> Identity {
        Identity {
            user_id: user_id.to_string(),
            email: format!("{}@x.com", user_id),
        }
    }

    fn request(place_id: &str) -> Value {
        json!({
            "place": place_id,
            "checkIn": "2024-06-01",
            "checkOut": "2024-06-04",
            "numberOfGuests": 2,
            "name": "Alice",
            "phone": "555-0100",
            "price": 300,
        })
    }

    async fn store_with_place(place_id: &str) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_place(&Place {
                id: place_id.to_string(),
                owner_id: "host".to_string(),
                title: "Cabin".to_string(),
                address: "Forest".to_string(),
                photos: vec![],
                description: String::new(),
                perks: vec![],
                extra_info: String::new(),
                check_in: "15:00".to_string(),
                check_out: "10:00".to_string(),
                max_guests: 4,
                price: 100.0,
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn create_stamps_the_caller_as_owner() {
        let bookings = BookingService::new(store_with_place("p1").await);
        let booking = bookings.create(&identity("alice"), &request("p1")).await.unwrap();

        assert_eq!(booking.user_id, "alice");
        assert_eq!(booking.place_id, "p1");
        assert_eq!(booking.check_in.to_string(), "2024-06-01");
    }

    #[tokio::test]
    async fn check_out_must_follow_check_in() {
        let bookings = BookingService::new(store_with_place("p1").await);
        let mut body = request("p1");
        body["checkOut"] = json!("2024-06-01");

        match bookings.create(&identity("alice"), &body).await {
            Err(ServiceError::Validation(errors)) => assert_eq!(errors[0].field, "checkOut"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_date_is_reported_alone() {
        let bookings = BookingService::new(store_with_place("p1").await);
        let mut body = request("p1");
        body.as_object_mut().unwrap().remove("checkIn");

        match bookings.create(&identity("alice"), &body).await {
            Err(ServiceError::Validation(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["checkIn"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn list_mine_never_returns_other_users_bookings() {
        let bookings = BookingService::new(store_with_place("p1").await);
        bookings.create(&identity("alice"), &request("p1")).await.unwrap();
        bookings.create(&identity("bob"), &request("p1")).await.unwrap();
        bookings.create(&identity("alice"), &request("p1")).await.unwrap();

        let mine = bookings.list_mine(&identity("alice")).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|b| b.booking.user_id == "alice"));
        assert!(mine.iter().all(|b| b.place.as_ref().map(|p| p.id.as_str()) == Some("p1")));
    }

    #[tokio::test]
    async fn dangling_place_reference_yields_empty_place() {
        let bookings = BookingService::new(store_with_place("p1").await);
        bookings.create(&identity("alice"), &request("p1")).await.unwrap();
        bookings.create(&identity("alice"), &request("gone")).await.unwrap();

        let mine = bookings.list_mine(&identity("alice")).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine[0].place.is_some());
        assert!(mine[1].place.is_none());
    }

    #[tokio::test]
    async fn single_booking_is_visible_only_to_its_owner() {
        let bookings = BookingService::new(store_with_place("p1").await);
        let booking = bookings.create(&identity("alice"), &request("p1")).await.unwrap();

        let own = bookings.get_by_id(&identity("alice"), &booking.id).await.unwrap();
        assert_eq!(own.booking, booking);

        let other = bookings.get_by_id(&identity("bob"), &booking.id).await;
        assert!(matches!(other, Err(ServiceError::Forbidden)));

        let missing = bookings.get_by_id(&identity("alice"), "nope").await;
        assert!(matches!(missing, Err(ServiceError::NotFound("booking"))));
    }
}
