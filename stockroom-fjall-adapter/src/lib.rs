//! # Stockroom Fjall Adapter
//!
//! A record store on the [fjall](https://docs.rs/fjall) LSM-tree keyspace.
//! Unlike the file-per-collection medium it addresses single records: adding,
//! updating or removing one record writes only that record, in one atomic
//! batch.
//!
//! ```rust,ignore
//! use stockroom::stockroom::Stockroom;
//! use stockroom_fjall_adapter::FjallModule;
//!
//! let module = FjallModule::with_config().db_path("/var/lib/stockroom").build();
//! let db = Stockroom::builder().load_module(module).open()?;
//! ```

mod config;
mod module;
mod store;
mod version;
mod wrapper;

pub use config::*;
pub use module::*;
pub use store::*;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
