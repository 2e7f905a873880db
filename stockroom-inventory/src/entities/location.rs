use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockroom::collection::RecordId;
use stockroom_derive::Entity;

use super::{active, Address};
use crate::timestamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    #[default]
    Warehouse,
    Store,
    DistributionCenter,
}

/// A place holding stock. `code` is unique.
#[derive(Entity, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[entity(collection = "locations")]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    pub code: String,
    #[serde(rename = "type", default)]
    pub location_type: LocationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<RecordId>,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Location {
    pub fn new(name: &str, code: &str, location_type: LocationType) -> Self {
        Location {
            id: None,
            name: name.to_string(),
            code: code.to_string(),
            location_type,
            address: None,
            manager_id: None,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom::common::Value;
    use stockroom::model::to_document;

    #[test]
    fn type_is_snake_case() {
        let location = Location::new("Hub", "DC1", LocationType::DistributionCenter);
        let doc = to_document(&location).unwrap();
        assert_eq!(doc.get("type"), Some(&Value::from("distribution_center")));
    }
}
