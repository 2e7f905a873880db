//! Shared building blocks: values, sort order, named locks and small helpers.

mod constants;
mod lock;
mod sort_order;
mod util;
mod value;

pub use constants::*;
pub use lock::*;
pub use sort_order::*;
pub use util::*;
pub use value::*;
