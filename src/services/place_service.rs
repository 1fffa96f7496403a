use std::sync::Arc;
use serde_json::Value;
use tracing::{info, warn};
use crate::errors::ServiceError;
use crate::helpers::validation::FieldReader;
use crate::models::place::{Place, PlaceDraft, PlacePatch};
use crate::repositories::Store;
use crate::services::auth_guard::ensure_owner;
use crate::services::new_record_id;
use crate::services::session_token::Identity;

pub struct PlaceService {
    store: Arc<dyn Store>,
}

impl PlaceService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, identity: &Identity, body: &Value) -> Result<Place, ServiceError> {
        let draft = parse_draft(body)?;
        let place = Place::from_draft(new_record_id(), identity.user_id.clone(), draft);
        self.store.insert_place(&place).await?;
        info!("User {} listed place {}", identity.user_id, place.id);

        Ok(place)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Place, ServiceError> {
        self.store
            .find_place(id)
            .await?
            .ok_or(ServiceError::NotFound("place"))
    }

    pub async fn list_all(&self) -> Result<Vec<Place>, ServiceError> {
        Ok(self.store.list_places().await?)
    }

    pub async fn list_by_owner(&self, identity: &Identity) -> Result<Vec<Place>, ServiceError> {
        Ok(self.store.list_places_by_owner(&identity.user_id).await?)
    }

    /// Load, check ownership, merge, then write conditionally on the owner so a
    /// write can never land on a place the caller does not own.
    pub async fn update(
        &self,
        identity: &Identity,
        id: &str,
        body: &Value,
    ) -> Result<Place, ServiceError> {
        let mut place = self.get_by_id(id).await?;
        ensure_owner(identity, &place.owner_id)?;

        let patch = parse_patch(body)?;
        place.apply(patch);

        if !self.store.update_place_if_owner(&place, &identity.user_id).await? {
            warn!("Conditional update of place {} by user {} wrote nothing", id, identity.user_id);
            return Err(ServiceError::Forbidden);
        }

        Ok(place)
    }
}

fn parse_draft(body: &Value) -> Result<PlaceDraft, ServiceError> {
    let mut reader = FieldReader::new(body)?;
    let draft = PlaceDraft {
        title: reader.required_string("title"),
        address: reader.required_string("address"),
        photos: reader.optional_string_list("addedPhotos").unwrap_or_default(),
        description: reader.optional_string("description").unwrap_or_default(),
        perks: reader.optional_string_list("perks").unwrap_or_default(),
        extra_info: reader.optional_string("extraInfo").unwrap_or_default(),
        check_in: reader.required_string("checkIn"),
        check_out: reader.required_string("checkOut"),
        max_guests: reader.required_integer("maxGuests", 1),
        price: reader.required_price("price"),
    };
    reader.finish()?;

    Ok(draft)
}

fn parse_patch(body: &Value) -> Result<PlacePatch, ServiceError> {
    let mut reader = FieldReader::new(body)?;
    let patch = PlacePatch {
        title: reader.optional_non_empty_string("title"),
        address: reader.optional_non_empty_string("address"),
        photos: reader.optional_string_list("addedPhotos"),
        description: reader.optional_string("description"),
        perks: reader.optional_string_list("perks"),
        extra_info: reader.optional_string("extraInfo"),
        check_in: reader.optional_non_empty_string("checkIn"),
        check_out: reader.optional_non_empty_string("checkOut"),
        max_guests: reader.optional_integer("maxGuests", 1),
        price: reader.optional_price("price"),
    };
    reader.finish()?;

    Ok(patch)
}
