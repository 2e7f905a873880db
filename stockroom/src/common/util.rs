use crate::common::OPERATOR_PREFIX;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub type Atomic<T> = Arc<RwLock<T>>;

#[inline]
pub fn atomic<T>(t: T) -> Atomic<T> {
    Arc::new(RwLock::new(t))
}

/// Milliseconds since the unix epoch, or zero if the clock is before it.
pub fn get_current_time_or_zero() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Strips one leading `$` so `$gte` and `gte`, `$total` and `total` read the same.
#[inline]
pub fn strip_operator_prefix(name: &str) -> &str {
    name.strip_prefix(OPERATOR_PREFIX).unwrap_or(name)
}

/// Collection names double as file names and partition names.
pub fn is_valid_collection_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
