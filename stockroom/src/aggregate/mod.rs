//! Aggregation pipelines.
//!
//! A pipeline is an ordered list of stages applied one after the other to an
//! in-memory record sequence. Each stage's output is the next stage's input;
//! stages are never reordered.
//!
//! | stage   | effect |
//! |---------|--------|
//! | `match` | keeps the records satisfying a filter document |
//! | `group` | merges records sharing a key into one record per key |
//! | `sort`  | stable multi-key sort |
//! | `limit` | keeps at most N leading records |
//!
//! Pipelines are written as documents, one per stage:
//!
//! ```rust,ignore
//! use stockroom::doc;
//!
//! let pipeline = vec![
//!     doc! { "$match": { productId: "P1" } },
//!     doc! { "$group": { _id: "productId", totalSales: { "$sum": "total" } } },
//! ];
//! ```
//!
//! or built with [`Pipeline`] directly.

mod accumulator;
mod group;
mod pipeline;
mod sort;
mod stage;

pub use accumulator::*;
pub use group::*;
pub use pipeline::*;
pub use sort::*;
pub use stage::*;
