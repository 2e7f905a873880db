use crate::common::Value;

use super::{ComparisonFilter, ComparisonMode, EqualsFilter, ExistsFilter, Filter};

/// Creates a fluent filter builder for the specified field name.
///
/// ```rust,ignore
/// use stockroom::filter::field;
///
/// let low_stock = field("currentStock").lt(10).and(field("isActive").eq(true));
/// ```
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// A fluent builder for filters on one field.
pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(EqualsFilter::new(self.field_name, value.into()))
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::Greater)
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::GreaterEqual)
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::Lesser)
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(value.into(), ComparisonMode::LesserEqual)
    }

    /// Matches records where the field is present (`true`) or absent (`false`).
    #[inline]
    pub fn exists(self, expected: bool) -> Filter {
        Filter::new(ExistsFilter::new(self.field_name, expected))
    }

    fn compare(self, value: Value, mode: ComparisonMode) -> Filter {
        Filter::new(ComparisonFilter::new(self.field_name, value, mode))
    }
}
