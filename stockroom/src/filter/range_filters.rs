use crate::collection::Document;
use crate::common::Value;
use crate::errors::StockroomResult;
use std::any::Any;
use std::cmp::Ordering;
use std::fmt::Display;

use super::FilterProvider;

/// Comparison operators understood by the query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonMode {
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
}

impl ComparisonMode {
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonMode::Greater => ordering == Ordering::Greater,
            ComparisonMode::GreaterEqual => ordering != Ordering::Less,
            ComparisonMode::Lesser => ordering == Ordering::Less,
            ComparisonMode::LesserEqual => ordering != Ordering::Greater,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            ComparisonMode::Greater => ">",
            ComparisonMode::GreaterEqual => ">=",
            ComparisonMode::Lesser => "<",
            ComparisonMode::LesserEqual => "<=",
        }
    }
}

/// Compares a record field against a bound.
///
/// Numbers compare numerically, strings lexicographically. A missing field
/// or a value of a different kind than the bound never matches.
pub struct ComparisonFilter {
    field_name: String,
    field_value: Value,
    comparison_mode: ComparisonMode,
}

impl ComparisonFilter {
    pub(crate) fn new(
        field_name: String,
        field_value: Value,
        comparison_mode: ComparisonMode,
    ) -> Self {
        ComparisonFilter {
            field_name,
            field_value,
            comparison_mode,
        }
    }

    pub fn comparison_mode(&self) -> ComparisonMode {
        self.comparison_mode
    }
}

impl Display for ComparisonFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({} {} {})",
            self.field_name,
            self.comparison_mode.symbol(),
            self.field_value
        )
    }
}

impl FilterProvider for ComparisonFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> StockroomResult<bool> {
        let ordering = entry
            .get(&self.field_name)
            .and_then(|value| value.compare(&self.field_value));
        Ok(ordering.is_some_and(|o| self.comparison_mode.accepts(o)))
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
