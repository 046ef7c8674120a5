//! Shipping addresses owned by a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    #[schema(example = "Asha Rao")]
    pub recipient_name: String,
    #[schema(example = "9876543210")]
    pub recipient_phone: String,
    #[schema(example = "12 MG Road")]
    pub street: String,
    pub city: Option<String>,
    pub state: Option<String>,
    #[schema(example = "560001")]
    pub zip_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub recipient_name: String,
    pub recipient_phone: String,
    pub street: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: String,
}

/// Partial address update; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressChanges {
    pub recipient_name: Option<String>,
    pub recipient_phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

impl AddressChanges {
    pub fn is_empty(&self) -> bool {
        self.recipient_name.is_none()
            && self.recipient_phone.is_none()
            && self.street.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.zip_code.is_none()
    }
}
