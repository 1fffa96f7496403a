use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub address: String,
    pub photos: Vec<String>,
    pub description: String,
    pub perks: Vec<String>,
    pub extra_info: String,
    pub check_in: String,
    pub check_out: String,
    pub max_guests: i32,
    pub price: f64,
}

/// Validated place fields as submitted by a client, before an id or owner is stamped.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaceDraft {
    pub title: String,
    pub address: String,
    pub photos: Vec<String>,
    pub description: String,
    pub perks: Vec<String>,
    pub extra_info: String,
    pub check_in: String,
    pub check_out: String,
    pub max_guests: i32,
    pub price: f64,
}

/// The whitelisted mutable fields of a place. Absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlacePatch {
    pub title: Option<String>,
    pub address: Option<String>,
    pub photos: Option<Vec<String>>,
    pub description: Option<String>,
    pub perks: Option<Vec<String>>,
    pub extra_info: Option<String>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub max_guests: Option<i32>,
    pub price: Option<f64>,
}

impl Place {
    pub fn from_draft(id: String, owner_id: String, draft: PlaceDraft) -> Self {
        Self {
            id,
            owner_id,
            title: draft.title,
            address: draft.address,
            photos: draft.photos,
            description: draft.description,
            perks: draft.perks,
            extra_info: draft.extra_info,
            check_in: draft.check_in,
            check_out: draft.check_out,
            max_guests: draft.max_guests,
            price: draft.price,
        }
    }

    /// Applies a patch. `id` and `owner_id` are never touched.
    pub fn apply(&mut self, patch: PlacePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(photos) = patch.photos {
            self.photos = photos;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(perks) = patch.perks {
            self.perks = perks;
        }
        if let Some(extra_info) = patch.extra_info {
            self.extra_info = extra_info;
        }
        if let Some(check_in) = patch.check_in {
            self.check_in = check_in;
        }
        if let Some(check_out) = patch.check_out {
            self.check_out = check_out;
        }
        if let Some(max_guests) = patch.max_guests {
            self.max_guests = max_guests;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
    }
}
