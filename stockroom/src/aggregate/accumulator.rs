use crate::collection::Document;
use crate::common::Value;

/// Operand of a `sum` accumulator.
#[derive(Debug, Clone, PartialEq)]
pub enum SumOperand {
    /// Adds the named field of every record. Missing or non-numeric values add nothing.
    Field(String),
    /// Adds the same constant for every record; `sum: 1` counts.
    Constant(Value),
}

/// A per-group running computation inside a `group` stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Sum(SumOperand),
    /// Mean of the named field. Every record of the group is counted; missing
    /// or non-numeric values contribute zero.
    Avg(String),
    Count,
}

impl Accumulator {
    pub(crate) fn start(&self) -> AccumulatorState {
        match self {
            Accumulator::Sum(_) => AccumulatorState::Sum(Total::Int(0)),
            Accumulator::Avg(_) => AccumulatorState::Avg {
                sum: Total::Int(0),
                count: 0,
            },
            Accumulator::Count => AccumulatorState::Count(0),
        }
    }
}

/// Running total that stays integral until a fractional value is added.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Total {
    Int(i64),
    Float(f64),
}

impl Total {
    fn add(self, value: Option<&Value>) -> Total {
        let value = match value {
            Some(v) if v.is_number() => v,
            _ => return self,
        };

        match (self, value) {
            (Total::Int(a), Value::I64(b)) => match a.checked_add(*b) {
                Some(sum) => Total::Int(sum),
                None => Total::Float(a as f64 + *b as f64),
            },
            (total, other) => Total::Float(total.as_f64() + other.as_number().unwrap_or(0.0)),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Total::Int(i) => i as f64,
            Total::Float(f) => f,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Total::Int(i) => Value::I64(i),
            Total::Float(f) => Value::F64(f),
        }
    }
}

/// Intermediate per-group state. Averages stay as a (sum, count) pair until
/// the group stage finalizes.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AccumulatorState {
    Sum(Total),
    Avg { sum: Total, count: u64 },
    Count(u64),
}

impl AccumulatorState {
    pub(crate) fn accumulate(&mut self, accumulator: &Accumulator, record: &Document) {
        match (self, accumulator) {
            (AccumulatorState::Sum(total), Accumulator::Sum(SumOperand::Field(field))) => {
                *total = total.add(record.get(field));
            }
            (AccumulatorState::Sum(total), Accumulator::Sum(SumOperand::Constant(constant))) => {
                *total = total.add(Some(constant));
            }
            (AccumulatorState::Avg { sum, count }, Accumulator::Avg(field)) => {
                *sum = sum.add(record.get(field));
                *count += 1;
            }
            (AccumulatorState::Count(count), Accumulator::Count) => {
                *count += 1;
            }
            _ => {}
        }
    }

    /// Converts the state into the output value. An average over zero
    /// records is zero.
    pub(crate) fn finalize(self) -> Value {
        match self {
            AccumulatorState::Sum(total) => total.into_value(),
            AccumulatorState::Avg { count: 0, .. } => Value::I64(0),
            AccumulatorState::Avg { sum, count } => Value::F64(sum.as_f64() / count as f64),
            AccumulatorState::Count(count) => Value::from(count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn run(accumulator: &Accumulator, records: &[Document]) -> Value {
        let mut state = accumulator.start();
        for record in records {
            state.accumulate(accumulator, record);
        }
        state.finalize()
    }

    #[test]
    fn sum_of_field_stays_integral() {
        let records = [doc! { total: 100 }, doc! { total: 200 }, doc! { total: 300 }];
        let sum = run(&Accumulator::Sum(SumOperand::Field("total".into())), &records);
        assert!(matches!(sum, Value::I64(600)));
    }

    #[test]
    fn sum_switches_to_float() {
        let records = [doc! { total: 1 }, doc! { total: 0.5 }];
        let sum = run(&Accumulator::Sum(SumOperand::Field("total".into())), &records);
        assert_eq!(sum, Value::F64(1.5));
    }

    #[test]
    fn sum_skips_missing_and_non_numeric() {
        let records = [doc! { total: 5 }, doc! { other: 1 }, doc! { total: "7" }];
        let sum = run(&Accumulator::Sum(SumOperand::Field("total".into())), &records);
        assert_eq!(sum, Value::I64(5));
    }

    #[test]
    fn sum_of_constant_counts() {
        let records = [doc! {}, doc! {}, doc! {}];
        let sum = run(&Accumulator::Sum(SumOperand::Constant(Value::I64(1))), &records);
        assert_eq!(sum, Value::I64(3));
    }

    #[test]
    fn avg_is_exact() {
        let records = [doc! { v: 10 }, doc! { v: 20 }, doc! { v: 30 }];
        let avg = run(&Accumulator::Avg("v".into()), &records);
        assert!(matches!(avg, Value::F64(x) if x == 20.0));
    }

    #[test]
    fn avg_counts_missing_as_zero() {
        let records = [doc! { v: 10 }, doc! {}];
        assert_eq!(run(&Accumulator::Avg("v".into()), &records), Value::F64(5.0));
    }

    #[test]
    fn avg_of_nothing_is_zero() {
        assert_eq!(run(&Accumulator::Avg("v".into()), &[]), Value::I64(0));
    }

    #[test]
    fn count_counts_records() {
        let records = [doc! {}, doc! { a: 1 }];
        assert_eq!(run(&Accumulator::Count, &records), Value::I64(2));
    }
}
