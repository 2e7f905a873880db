//! Record stores.
//!
//! A record store is the durable home of named collections. Every medium
//! implements [RecordStoreProvider]; callers go through the [RecordStore]
//! handle, which validates names and identifiers and serializes mutations per
//! collection. Media are plugged into a database through a [StoreModule].

pub mod json;
pub mod memory;
mod record_store;
mod store_module;

pub use record_store::*;
pub use store_module::*;
