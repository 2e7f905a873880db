use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockroom::collection::RecordId;
use stockroom_derive::Entity;

use super::{active, Address};
use crate::timestamp;

#[derive(Entity, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[entity(collection = "suppliers")]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub lead_time_days: i64,
    /// 0 to 5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Supplier {
    pub fn new(name: &str) -> Self {
        Supplier {
            id: None,
            name: name.to_string(),
            contact_person: None,
            email: None,
            phone: None,
            address: None,
            payment_terms: None,
            lead_time_days: 0,
            rating: None,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }
}
