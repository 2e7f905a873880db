//! Records and their identity.
//!
//! A [`Document`] is one record: a mapping from field name to
//! [`Value`](crate::common::Value), always carrying a string identifier in `_id`
//! once it has been stored.
//!
//! ```rust,ignore
//! use stockroom::collection::{Document, RecordId};
//!
//! let mut doc = Document::new();
//! doc.put("sku", "A-100")?;
//! doc.put("pricing.costPrice", 4.5)?;
//! doc.set_id(&RecordId::new());
//! ```

mod document;
mod record_id;
pub(crate) mod snowflake;
mod write_result;

pub use document::*;
pub use record_id::*;
pub use write_result::*;
