use crate::collection::Document;
use crate::common::Value;
use crate::errors::StockroomResult;
use std::any::Any;
use std::fmt::Display;

use super::FilterProvider;

/// Matches every record.
pub(crate) struct AllFilter {}

impl Display for AllFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AllFilter")
    }
}

impl FilterProvider for AllFilter {
    #[inline]
    fn apply(&self, _entry: &Document) -> StockroomResult<bool> {
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Exact equality between a record field and a literal.
///
/// A field the record does not have never equals anything, not even `null`.
pub struct EqualsFilter {
    field_name: String,
    field_value: Value,
}

impl EqualsFilter {
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        EqualsFilter {
            field_name,
            field_value,
        }
    }

    pub fn field_value(&self) -> &Value {
        &self.field_value
    }
}

impl Display for EqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} == {})", self.field_name, self.field_value)
    }
}

impl FilterProvider for EqualsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> StockroomResult<bool> {
        Ok(entry
            .get(&self.field_name)
            .is_some_and(|value| value == &self.field_value))
    }

    fn has_field(&self) -> bool {
        true
    }

    fn get_field_name(&self) -> StockroomResult<String> {
        Ok(self.field_name.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Presence check. A field holding `null` is present; an absent field is not.
pub struct ExistsFilter {
    field_name: String,
    expected: bool,
}

impl ExistsFilter {
    pub(crate) fn new(field_name: String, expected: bool) -> Self {
        ExistsFilter {
            field_name,
            expected,
        }
    }
}

impl Display for ExistsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.expected {
            write!(f, "({} exists)", self.field_name)
        } else {
            write!(f, "({} not exists)", self.field_name)
        }
    }
}

impl FilterProvider for ExistsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> StockroomResult<bool> {
        Ok(entry.contains_field(&self.field_name) == self.expected)
    }

    fn has_field(&self) -> bool {
        true
    }

    fn get_field_name(&self) -> StockroomResult<String> {
        Ok(self.field_name.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Stands in for an operator the query engine does not know.
///
/// Only built under the lenient query policy; it accepts every record so the
/// rest of the filter still applies.
pub struct UnsupportedFilter {
    field_name: String,
    operator: String,
}

impl UnsupportedFilter {
    pub(crate) fn new(field_name: String, operator: String) -> Self {
        UnsupportedFilter {
            field_name,
            operator,
        }
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }
}

impl Display for UnsupportedFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} {} ignored)", self.field_name, self.operator)
    }
}

impl FilterProvider for UnsupportedFilter {
    #[inline]
    fn apply(&self, _entry: &Document) -> StockroomResult<bool> {
        Ok(true)
    }

    fn has_field(&self) -> bool {
        true
    }

    fn get_field_name(&self) -> StockroomResult<String> {
        Ok(self.field_name.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
