use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockroom::collection::RecordId;
use stockroom_derive::Entity;

use super::active;
use crate::timestamp;

/// A catalog item. `sku` is unique; so is `barcode` when present.
#[derive(Entity, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[entity(collection = "products")]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub name: String,
    pub sku: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<SupplierTerms>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<RecordId>,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn new(name: &str, sku: &str, category: &str) -> Self {
        Product {
            id: None,
            name: name.to_string(),
            sku: sku.to_string(),
            barcode: None,
            category: category.to_string(),
            description: String::new(),
            pricing: Pricing::default(),
            supplier: None,
            specifications: BTreeMap::new(),
            is_active: true,
            created_by: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_pricing(mut self, cost_price: f64, selling_price: f64) -> Self {
        self.pricing.cost_price = cost_price;
        self.pricing.selling_price = selling_price;
        self
    }

    pub fn with_supplier(mut self, supplier: SupplierTerms) -> Self {
        self.supplier = Some(supplier);
        self
    }

    pub fn with_barcode(mut self, barcode: &str) -> Self {
        self.barcode = Some(barcode.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn cost_price(&self) -> f64 {
        self.pricing.cost_price
    }

    pub fn minimum_order_quantity(&self) -> i64 {
        self.supplier
            .as_ref()
            .map(|s| s.minimum_order_quantity)
            .unwrap_or(0)
    }

    pub fn supplier_name(&self) -> &str {
        self.supplier
            .as_ref()
            .map(|s| s.supplier_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pricing {
    pub cost_price: f64,
    pub selling_price: f64,
    pub currency: String,
}

impl Default for Pricing {
    fn default() -> Self {
        Pricing {
            cost_price: 0.0,
            selling_price: 0.0,
            currency: "USD".to_string(),
        }
    }
}

impl Pricing {
    /// Selling margin as a share of the selling price.
    pub fn margin(&self) -> Option<f64> {
        if self.selling_price > 0.0 {
            Some((self.selling_price - self.cost_price) / self.selling_price)
        } else {
            None
        }
    }
}

/// How a product is bought: from whom, how fast and in what batches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupplierTerms {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<RecordId>,
    pub supplier_name: String,
    pub lead_time_days: i64,
    pub minimum_order_quantity: i64,
}
