use std::fmt::{Display, Formatter};

use crate::collection::Document;
use crate::common::{strip_operator_prefix, SortOrder, Value, DOC_ID};
use crate::errors::{ErrorKind, StockroomError, StockroomResult};
use crate::filter::{Filter, FilterParser, QueryPolicy};

use super::{Accumulator, GroupKey, GroupStage, SortStage, SumOperand};

/// One step of a [Pipeline](super::Pipeline).
#[derive(Debug, Clone)]
pub enum Stage {
    Match(Filter),
    Group(GroupStage),
    Sort(SortStage),
    Limit(usize),
    /// A stage that was not understood. Passes its input through unchanged.
    Unsupported(String),
}

impl Stage {
    pub(crate) fn apply(&self, records: Vec<Document>) -> StockroomResult<Vec<Document>> {
        match self {
            Stage::Match(filter) => filter.select(records),
            Stage::Group(group) => Ok(group.apply(records)),
            Stage::Sort(sort) => Ok(sort.apply(records)),
            Stage::Limit(limit) => {
                let mut records = records;
                records.truncate(*limit);
                Ok(records)
            }
            Stage::Unsupported(_) => Ok(records),
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Match(filter) => write!(f, "match {}", filter),
            Stage::Group(group) => write!(f, "group by {:?}", group.key()),
            Stage::Sort(sort) => write!(f, "sort {:?}", sort.keys()),
            Stage::Limit(limit) => write!(f, "limit {}", limit),
            Stage::Unsupported(name) => write!(f, "{} (ignored)", name),
        }
    }
}

// operators inside one stage document run in this order
const STAGE_ORDER: [&str; 4] = ["match", "group", "sort", "limit"];

/// Turns pipeline stage documents into [Stage]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageParser {
    policy: QueryPolicy,
}

impl StageParser {
    pub fn new(policy: QueryPolicy) -> Self {
        StageParser { policy }
    }

    /// Parses one stage document. A document normally holds a single stage
    /// operator; when it holds several they expand to `match`, `group`,
    /// `sort`, `limit` in that order, with unknown operators last.
    pub fn parse(&self, stage: &Document) -> StockroomResult<Vec<Stage>> {
        let mut stages = Vec::new();
        for name in STAGE_ORDER {
            for (key, spec) in stage.iter() {
                if strip_operator_prefix(key) == name {
                    stages.push(self.parse_operator(key, spec)?);
                }
            }
        }

        for (key, _) in stage.iter() {
            if !STAGE_ORDER.contains(&strip_operator_prefix(key)) {
                stages.push(self.unsupported(key, "unsupported pipeline stage")?);
            }
        }
        Ok(stages)
    }

    fn parse_operator(&self, key: &str, spec: &Value) -> StockroomResult<Stage> {
        match (strip_operator_prefix(key), spec) {
            ("match", Value::Document(filter)) => {
                Ok(Stage::Match(FilterParser::new(self.policy).parse(filter)?))
            }
            ("group", Value::Document(group)) => self.parse_group(key, group),
            ("sort", spec) => self.parse_sort(key, spec),
            ("limit", spec) => match spec.as_i64() {
                Some(limit) if limit >= 0 => Ok(Stage::Limit(limit as usize)),
                _ => self.unsupported(key, "limit must be a non-negative integer"),
            },
            _ => self.unsupported(key, "stage specification must be a document"),
        }
    }

    fn parse_group(&self, key: &str, spec: &Document) -> StockroomResult<Stage> {
        let group_key = match spec.get(DOC_ID) {
            Some(Value::String(field)) => GroupKey::Field(strip_field_ref(field)),
            Some(Value::Document(pairs)) if !pairs.is_empty() => GroupKey::Composite(
                pairs
                    .iter()
                    .map(|(label, field)| {
                        let field = field
                            .as_str()
                            .map(strip_field_ref)
                            .unwrap_or_else(|| label.clone());
                        (label.clone(), field)
                    })
                    .collect(),
            ),
            _ => GroupKey::All,
        };

        let mut group = GroupStage::new(group_key);
        for (name, accumulator) in spec.iter() {
            if name == DOC_ID {
                continue;
            }
            match self.parse_accumulator(name, accumulator)? {
                Some(accumulator) => group = group.accumulate(name, accumulator),
                None => continue,
            }
        }

        log::debug!("Parsed {} stage {:?}", key, group);
        Ok(Stage::Group(group))
    }

    fn parse_accumulator(&self, name: &str, spec: &Value) -> StockroomResult<Option<Accumulator>> {
        let operators = match spec {
            Value::Document(operators) if operators.size() == 1 => operators,
            _ => {
                return self.skip_accumulator(name, "accumulator must hold exactly one operator");
            }
        };

        let Some((operator, operand)) = operators.iter().next() else {
            return Ok(None);
        };

        let accumulator = match (strip_operator_prefix(operator), operand) {
            ("sum", Value::String(field)) => {
                Accumulator::Sum(SumOperand::Field(strip_field_ref(field)))
            }
            ("sum", constant) if constant.is_number() => {
                Accumulator::Sum(SumOperand::Constant(constant.clone()))
            }
            ("avg", Value::String(field)) => Accumulator::Avg(strip_field_ref(field)),
            ("count", _) => Accumulator::Count,
            (other, _) => {
                return self.skip_accumulator(
                    name,
                    &format!("unsupported accumulator {} or operand", other),
                );
            }
        };
        Ok(Some(accumulator))
    }

    fn parse_sort(&self, key: &str, spec: &Value) -> StockroomResult<Stage> {
        let mut sort = SortStage::new();
        match spec {
            Value::Document(keys) if !keys.is_empty() => {
                for (field, direction) in keys.iter() {
                    sort = sort.by(field, SortOrder::from_direction(direction));
                }
            }
            // [["field", -1], ["other", 1]]
            Value::Array(pairs) if !pairs.is_empty() => {
                for pair in pairs {
                    match pair.as_array().map(|p| p.as_slice()) {
                        Some([Value::String(field), direction]) => {
                            sort = sort.by(field, SortOrder::from_direction(direction));
                        }
                        _ => return self.unsupported(key, "sort pairs must be [field, direction]"),
                    }
                }
            }
            _ => return self.unsupported(key, "sort specification must map fields to directions"),
        }
        Ok(Stage::Sort(sort))
    }

    fn skip_accumulator(&self, name: &str, reason: &str) -> StockroomResult<Option<Accumulator>> {
        match self.policy {
            QueryPolicy::Lenient => {
                log::warn!("Skipping group field {}: {}", name, reason);
                Ok(None)
            }
            QueryPolicy::Strict => {
                log::error!("Invalid group field {}: {}", name, reason);
                Err(StockroomError::new(
                    &format!("Invalid group field {}: {}", name, reason),
                    ErrorKind::PipelineError,
                ))
            }
        }
    }

    fn unsupported(&self, key: &str, reason: &str) -> StockroomResult<Stage> {
        match self.policy {
            QueryPolicy::Lenient => {
                log::warn!("Ignoring pipeline stage {}: {}", key, reason);
                Ok(Stage::Unsupported(key.to_string()))
            }
            QueryPolicy::Strict => {
                log::error!("Invalid pipeline stage {}: {}", key, reason);
                Err(StockroomError::new(
                    &format!("Invalid pipeline stage {}: {}", key, reason),
                    ErrorKind::PipelineError,
                ))
            }
        }
    }
}

/// Field references may be written `total` or `$total`.
fn strip_field_ref(field: &str) -> String {
    strip_operator_prefix(field).to_string()
}
