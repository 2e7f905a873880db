mod repository_test;

use serde::{Deserialize, Serialize};
use stockroom::collection::RecordId;
use stockroom_derive::Entity;

#[derive(Entity, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[entity(collection = "suppliers")]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    pub lead_time_days: i64,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl Vendor {
    pub fn new(name: &str, lead_time_days: i64) -> Self {
        Vendor {
            id: None,
            name: name.to_string(),
            lead_time_days,
            rating: None,
        }
    }
}

#[derive(Entity, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[entity(collection = "shipments", id = "shipment_id")]
pub struct Shipment {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub shipment_id: Option<RecordId>,
    pub vendor: RecordId,
    pub units: i64,
}
