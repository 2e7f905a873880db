//! # Stockroom Inventory
//!
//! Inventory management on top of the stockroom document layer: a product
//! catalog, stock levels per location with a movement ledger, alerts, sales
//! analytics, suppliers, users and a currency rate cache.
//!
//! Every service is a cheap handle over typed repositories of one
//! [Stockroom](stockroom::stockroom::Stockroom). [Warehouse] opens all of
//! them at once:
//!
//! ```rust,ignore
//! use stockroom::stockroom::Stockroom;
//! use stockroom_inventory::entities::{Location, LocationType, Product};
//! use stockroom_inventory::services::Adjustment;
//! use stockroom_inventory::Warehouse;
//!
//! let db = Stockroom::builder().open()?;
//! let warehouse = Warehouse::open(&db)?;
//!
//! let product = warehouse.catalog().create_product(Product::new("Bolt", "B-1", "hardware"), None)?;
//! let location = warehouse.locations().create(Location::new("Main", "WH1", LocationType::Warehouse))?;
//! warehouse.stock().adjust(Adjustment::new(product.id.unwrap(), location.id.unwrap(), 40))?;
//! ```

pub mod entities;
pub mod services;
pub mod timestamp;
mod warehouse;

pub use warehouse::*;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
