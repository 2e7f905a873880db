//! Query filters.
//!
//! A filter selects the records of a collection. Filters are written either
//! as filter documents, the form callers pass to the facade:
//!
//! ```rust,ignore
//! use stockroom::doc;
//!
//! // equality on one field, range on another, both must hold
//! let filter = doc! { category: "X", currentStock: { "$gte": 5, "$lt": 20 } };
//! ```
//!
//! or with the fluent API:
//!
//! ```rust,ignore
//! use stockroom::filter::field;
//!
//! let filter = field("category").eq("X").and(field("currentStock").gte(5));
//! ```
//!
//! Every top-level condition is conjoined. A field missing from a record fails
//! equality and comparisons, and reports `false` for `$exists`.

mod basic_filters;
mod filter;
mod fluent;
mod logical_filters;
mod parser;
mod range_filters;

pub use basic_filters::*;
pub use filter::*;
pub use fluent::*;
pub use logical_filters::*;
pub use parser::*;
pub use range_filters::*;
