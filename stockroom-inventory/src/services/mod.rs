//! Inventory services.
//!
//! Each service is a cheap, cloneable handle over the repositories it needs.
//! Lookups by identifier answer `None` or `false` when nothing matches;
//! operations that need a referenced record to exist fail with
//! [ErrorKind::NotFound](stockroom::errors::ErrorKind::NotFound).

mod alerts;
mod analytics;
mod catalog;
mod currency;
mod locations;
mod paging;
mod stock;
mod suppliers;
mod users;

pub use alerts::*;
pub use analytics::*;
pub use catalog::*;
pub use currency::*;
pub use locations::*;
pub use paging::*;
pub use stock::*;
pub use suppliers::*;
pub use users::*;

use stockroom::collection::RecordId;
use stockroom::errors::{ErrorKind, StockroomError, StockroomResult};

pub(crate) fn validation_error(message: &str) -> StockroomError {
    log::error!("{}", message);
    StockroomError::new(message, ErrorKind::ValidationError)
}

pub(crate) fn not_found(what: &str, id: &RecordId) -> StockroomError {
    log::error!("{} {} not found", what, id);
    StockroomError::new(&format!("{} {} not found", what, id), ErrorKind::NotFound)
}

pub(crate) fn require_text(field: &str, value: &str) -> StockroomResult<()> {
    if value.trim().is_empty() {
        return Err(validation_error(&format!("{} is required", field)));
    }
    Ok(())
}
