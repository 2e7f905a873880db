//! Typed records of the inventory domain.
//!
//! Field names are stored in camel case. Every entity carries its identifier
//! under `_id` and the `createdAt`/`updatedAt` instants maintained by the
//! services.

mod alert;
mod inventory;
mod location;
mod product;
mod sale;
mod supplier;
mod user;

pub use alert::*;
pub use inventory::*;
pub use location::*;
pub use product::*;
pub use sale::*;
pub use supplier::*;
pub use user::*;

use serde::{Deserialize, Serialize};

/// Postal address shared by locations and suppliers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

pub(crate) fn active() -> bool {
    true
}
