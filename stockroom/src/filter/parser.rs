use crate::collection::Document;
use crate::common::{strip_operator_prefix, Value, OPERATOR_PREFIX};
use crate::errors::{ErrorKind, StockroomError, StockroomResult};

use super::{
    all, and, ComparisonFilter, ComparisonMode, EqualsFilter, ExistsFilter, Filter,
    UnsupportedFilter,
};

/// How the query engine treats operators and pipeline stages it does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryPolicy {
    /// Unknown operators accept every record and unknown stages pass their
    /// input through unchanged. Each occurrence is logged as a warning.
    #[default]
    Lenient,
    /// Unknown operators and stages are rejected with an error.
    Strict,
}

const KNOWN_OPERATORS: [&str; 5] = ["gte", "lte", "gt", "lt", "exists"];

/// Turns filter documents into [Filter]s.
///
/// A filter document maps field names to either a literal, meaning exact
/// equality, or an operator object such as `{ "$gte": 5, "$lt": 10 }` whose
/// operators must all hold. Operator names may be written with or without
/// the leading `$`. An object whose keys are not all operator names and that
/// carries no `$` key is an embedded document literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterParser {
    policy: QueryPolicy,
}

impl FilterParser {
    pub fn new(policy: QueryPolicy) -> Self {
        FilterParser { policy }
    }

    pub fn policy(&self) -> QueryPolicy {
        self.policy
    }

    pub fn parse(&self, filter: &Document) -> StockroomResult<Filter> {
        if filter.is_empty() {
            return Ok(all());
        }

        let mut filters = Vec::with_capacity(filter.size());
        for (field_name, value) in filter.iter() {
            if field_name.starts_with(OPERATOR_PREFIX) {
                // top-level operators such as $or or $text
                filters.push(self.unsupported(field_name, field_name)?);
                continue;
            }

            match value {
                Value::Document(operators) if Self::is_operator_object(operators) => {
                    for (operator, operand) in operators.iter() {
                        filters.push(self.operator_filter(field_name, operator, operand)?);
                    }
                }
                literal => filters.push(Filter::new(EqualsFilter::new(
                    field_name.clone(),
                    literal.clone(),
                ))),
            }
        }

        if filters.len() == 1 {
            Ok(filters.remove(0))
        } else {
            Ok(and(filters))
        }
    }

    fn is_operator_object(value: &Document) -> bool {
        if value.is_empty() {
            return false;
        }
        value.iter().any(|(key, _)| key.starts_with(OPERATOR_PREFIX))
            || value
                .iter()
                .all(|(key, _)| KNOWN_OPERATORS.contains(&strip_operator_prefix(key)))
    }

    fn operator_filter(
        &self,
        field_name: &str,
        operator: &str,
        operand: &Value,
    ) -> StockroomResult<Filter> {
        let field = field_name.to_string();
        let mode = match strip_operator_prefix(operator) {
            "gte" => ComparisonMode::GreaterEqual,
            "lte" => ComparisonMode::LesserEqual,
            "gt" => ComparisonMode::Greater,
            "lt" => ComparisonMode::Lesser,
            "exists" => {
                let expected = match operand {
                    Value::Bool(b) => *b,
                    Value::Null => false,
                    other => other.as_number().is_some_and(|n| n != 0.0),
                };
                return Ok(Filter::new(ExistsFilter::new(field, expected)));
            }
            _ => return self.unsupported(field_name, operator),
        };
        Ok(Filter::new(ComparisonFilter::new(field, operand.clone(), mode)))
    }

    fn unsupported(&self, field_name: &str, operator: &str) -> StockroomResult<Filter> {
        match self.policy {
            QueryPolicy::Lenient => {
                log::warn!(
                    "Ignoring unsupported filter operator {} on field {}",
                    operator,
                    field_name
                );
                Ok(Filter::new(UnsupportedFilter::new(
                    field_name.to_string(),
                    operator.to_string(),
                )))
            }
            QueryPolicy::Strict => {
                log::error!(
                    "Unsupported filter operator {} on field {}",
                    operator,
                    field_name
                );
                Err(StockroomError::new(
                    &format!("Unsupported filter operator {} on field {}", operator, field_name),
                    ErrorKind::FilterError,
                ))
            }
        }
    }
}
