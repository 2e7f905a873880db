//! # Stockroom - Embedded Document Layer
//!
//! Stockroom is a small embedded document layer for inventory-style applications.
//! Records are schemaless documents grouped into named collections. Collections are
//! read and written through a pluggable record store, queried with filter documents
//! and summarised with a sequential aggregation pipeline.
//!
//! ## Key Features
//!
//! - **Record stores**: in-memory, JSON files on disk, or any [`store::RecordStoreProvider`]
//!   (the `stockroom-fjall-adapter` crate ships a per-record embedded store)
//! - **Filters**: equality plus `$gte`, `$lte`, `$gt`, `$lt` and `$exists` operators,
//!   written as documents or with the fluent [`filter::field`] API
//! - **Aggregation**: `match`, `group` (with `sum`, `avg`, `count`), `sort` and `limit` stages
//! - **Populate**: one-level resolution of foreign identifiers to the referenced record
//! - **Typed repositories**: [`model::Repository`] over any serde type deriving `Entity`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stockroom::doc;
//! use stockroom::stockroom::Stockroom;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Stockroom::builder().open()?;
//! let products = db.model("products")?;
//!
//! products.create(doc! { sku: "A", category: "X" })?;
//! products.create(doc! { sku: "B", category: "Y" })?;
//!
//! let found = products.find(&doc! { category: "X" })?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Pattern
//!
//! Public handles ([`stockroom::Stockroom`], [`store::RecordStore`], [`model::Model`])
//! are cheap to clone and share their state through an inner `Arc`.
//!
//! ## Module Organization
//!
//! - [`aggregate`] - Aggregation pipeline stages and accumulators
//! - [`collection`] - Documents, record identifiers and write results
//! - [`common`] - Values, sort order, locks and shared helpers
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Query filters, the fluent API and the filter document parser
//! - [`model`] - Facade model, populate, typed entities and repositories
//! - [`store`] - Record store abstraction and built-in media
//! - [`stockroom`] - Database handle
//! - [`stockroom_builder`] - Builder for opening a database
//! - [`stockroom_config`] - Database configuration

use crate::collection::snowflake::SnowflakeIdGenerator;
use std::sync::LazyLock;

pub mod aggregate;
pub mod collection;
pub mod common;
pub mod errors;
pub mod filter;
pub mod model;
pub mod stockroom;
pub mod stockroom_builder;
pub mod stockroom_config;
pub mod store;

pub(crate) static ID_GENERATOR: LazyLock<SnowflakeIdGenerator> =
    LazyLock::new(SnowflakeIdGenerator::new);

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
