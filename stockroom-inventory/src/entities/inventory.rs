use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockroom::collection::RecordId;
use stockroom::errors::StockroomResult;
use stockroom_derive::Entity;

use crate::services::validation_error;
use crate::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    Adjustment,
    Transfer,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Adjustment => "adjustment",
            MovementType::Transfer => "transfer",
        }
    }
}

/// One entry of the stock ledger of an inventory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub movement_id: String,
    pub movement_type: MovementType,
    /// Always non-negative; the type tells the direction.
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_location: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_location: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_by: Option<RecordId>,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Stock of one product at one location.
#[derive(Entity, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[entity(collection = "inventories")]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub product_id: RecordId,
    pub location_id: RecordId,
    #[serde(default)]
    pub current_stock: i64,
    #[serde(default)]
    pub reserved_stock: i64,
    #[serde(default)]
    pub available_stock: i64,
    #[serde(default)]
    pub reorder_point: i64,
    #[serde(default)]
    pub max_stock: i64,
    #[serde(default)]
    pub movements: Vec<Movement>,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl InventoryRecord {
    pub fn new(product_id: RecordId, location_id: RecordId) -> Self {
        InventoryRecord {
            id: None,
            product_id,
            location_id,
            current_stock: 0,
            reserved_stock: 0,
            available_stock: 0,
            reorder_point: 0,
            max_stock: 0,
            movements: Vec::new(),
            last_updated: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Applies a signed stock change and records the movement. Fails without
    /// touching the record when the new stock is out of range.
    pub(crate) fn apply(
        &mut self,
        delta: i64,
        movement: Movement,
        at: DateTime<Utc>,
    ) -> StockroomResult<()> {
        let current = self.current_stock;
        self.current_stock = current.checked_add(delta).ok_or_else(|| {
            validation_error(&format!(
                "Stock change of {} is out of range for current stock {}",
                delta, current
            ))
        })?;
        self.last_updated = Some(at);
        self.movements.push(movement);
        Ok(())
    }

    /// Refreshes derived fields; called before every save.
    pub(crate) fn touch(&mut self, at: DateTime<Utc>) {
        self.available_stock = self.current_stock.saturating_sub(self.reserved_stock);
        if self.created_at.is_none() {
            self.created_at = Some(at);
        }
        self.updated_at = Some(at);
    }

    pub fn is_below_reorder_point(&self) -> bool {
        self.current_stock < self.reorder_point
    }

    pub fn is_at_or_below_reorder_point(&self) -> bool {
        self.current_stock <= self.reorder_point
    }
}
