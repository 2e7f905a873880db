//! Collection facades.
//!
//! [Model] is the untyped facade over one collection: records in, records
//! out, filters and pipelines written as documents. [Repository] offers the
//! same operations over a serde type implementing [Entity].
//!
//! `find_one`, `update_one` and `delete_one` act on the first match in store
//! order, which is insertion order. They are deterministic only when the
//! filter matches at most one record; they do not enforce uniqueness.

mod entity;
#[allow(clippy::module_inception)]
mod model;
mod populate;
mod repository;

pub use entity::*;
pub use model::*;
pub use populate::*;
pub use repository::*;
