//! A record store keeping one JSON file per collection.
//!
//! Each collection lives in `<data_dir>/<collection>.json` as an array of
//! records. Writes go to a temporary sibling file which then replaces the
//! collection file, so readers never observe a half-written collection.

mod config;
mod module;
mod store;

pub use config::*;
pub use module::*;
pub use store::*;
