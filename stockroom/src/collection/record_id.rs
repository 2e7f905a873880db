use crate::errors::{ErrorKind, StockroomError, StockroomResult};
use crate::ID_GENERATOR;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The identifier stored in a record's `_id` field.
///
/// Fresh identifiers come from a snowflake generator and are rendered as
/// decimal strings, so later identifiers sort after earlier ones within one
/// process. Identifiers read back from storage may be any non-empty string.
///
/// # Examples
///
/// ```rust,ignore
/// use stockroom::collection::RecordId;
///
/// let id = RecordId::new();
/// let same = RecordId::parse(id.as_str())?;
/// assert_eq!(id, same);
/// ```
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generates a new unique identifier.
    pub fn new() -> Self {
        RecordId(ID_GENERATOR.get_id().to_string())
    }

    /// Validates an identifier received from a caller.
    pub fn parse(value: &str) -> StockroomResult<Self> {
        if value.trim().is_empty() {
            log::error!("Record identifier cannot be empty");
            return Err(StockroomError::new(
                "Record identifier cannot be empty",
                ErrorKind::InvalidId,
            ));
        }
        Ok(RecordId(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        RecordId::new()
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId(value)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}
