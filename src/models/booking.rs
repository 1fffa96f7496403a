use serde::{Deserialize, Serialize};
use time::Date;
use crate::models::place::Place;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub place_id: String,
    pub user_id: String,
    pub check_in: Date,
    pub check_out: Date,
    pub number_of_guests: i32,
    pub guest_name: String,
    pub guest_phone: String,
    pub price: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BookingDraft {
    pub place_id: String,
    pub check_in: Date,
    pub check_out: Date,
    pub number_of_guests: i32,
    pub guest_name: String,
    pub guest_phone: String,
    pub price: f64,
}

impl Booking {
    pub fn from_draft(id: String, user_id: String, draft: BookingDraft) -> Self {
        Self {
            id,
            place_id: draft.place_id,
            user_id,
            check_in: draft.check_in,
            check_out: draft.check_out,
            number_of_guests: draft.number_of_guests,
            guest_name: draft.guest_name,
            guest_phone: draft.guest_phone,
            price: draft.price,
        }
    }
}

/// A booking resolved against the place it references. `place` is `None` when
/// the reference dangles.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BookingWithPlace {
    #[serde(flatten)]
    pub booking: Booking,
    pub place: Option<Place>,
}
