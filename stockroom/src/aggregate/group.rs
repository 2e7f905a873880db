use indexmap::IndexMap;
use itertools::Itertools;

use crate::collection::Document;
use crate::common::{Value, DOC_ID, GROUP_ALL_KEY, GROUP_KEY_PAIR_SEPARATOR, GROUP_KEY_SEPARATOR};

use super::{Accumulator, AccumulatorState};

/// How a `group` stage derives the key of each record.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    /// Groups by the value of one field. Records lacking the field share the
    /// `null` group.
    Field(String),
    /// Groups by several fields at once. Each pair is `(label, field)`; the
    /// key renders as `label:value` pairs joined by `_`, for example
    /// `year:2024_month:3`.
    Composite(Vec<(String, String)>),
    /// Every record falls into the single group `"all"`.
    All,
}

impl GroupKey {
    fn key_of(&self, record: &Document) -> Value {
        match self {
            GroupKey::Field(field) => record.get(field).cloned().unwrap_or(Value::Null),
            GroupKey::Composite(pairs) => {
                let key = pairs
                    .iter()
                    .map(|(label, field)| {
                        let value = record
                            .get(field)
                            .map(|v| v.to_key_string())
                            .unwrap_or_else(|| Value::Null.to_key_string());
                        format!("{}{}{}", label, GROUP_KEY_PAIR_SEPARATOR, value)
                    })
                    .join(GROUP_KEY_SEPARATOR);
                Value::String(key)
            }
            GroupKey::All => Value::from(GROUP_ALL_KEY),
        }
    }
}

/// A `group` stage: one output record per distinct key, in the order keys
/// are first seen. Each output carries the key under `_id` followed by the
/// accumulated fields.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStage {
    key: GroupKey,
    accumulators: Vec<(String, Accumulator)>,
}

impl GroupStage {
    pub fn new(key: GroupKey) -> Self {
        GroupStage {
            key,
            accumulators: Vec::new(),
        }
    }

    pub fn by_field(field: &str) -> Self {
        GroupStage::new(GroupKey::Field(field.to_string()))
    }

    pub fn by_all() -> Self {
        GroupStage::new(GroupKey::All)
    }

    /// Adds an output field computed by `accumulator`. A later accumulator
    /// with the same name replaces the earlier one.
    pub fn accumulate(mut self, name: &str, accumulator: Accumulator) -> Self {
        self.accumulators.retain(|(existing, _)| existing != name);
        self.accumulators.push((name.to_string(), accumulator));
        self
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn accumulators(&self) -> &[(String, Accumulator)] {
        &self.accumulators
    }

    pub(crate) fn apply(&self, records: Vec<Document>) -> Vec<Document> {
        let mut groups: IndexMap<Value, Vec<AccumulatorState>> = IndexMap::new();

        for record in &records {
            let states = groups.entry(self.key.key_of(record)).or_insert_with(|| {
                self.accumulators
                    .iter()
                    .map(|(_, accumulator)| accumulator.start())
                    .collect()
            });

            for (state, (_, accumulator)) in states.iter_mut().zip(&self.accumulators) {
                state.accumulate(accumulator, record);
            }
        }

        groups
            .into_iter()
            .map(|(key, states)| {
                let mut output = Document::new();
                // group keys are not always strings, so bypass id validation
                output.insert_raw(DOC_ID.to_string(), key);
                for (state, (name, _)) in states.into_iter().zip(&self.accumulators) {
                    output.insert_raw(name.clone(), state.finalize());
                }
                output
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::SumOperand;
    use crate::doc;

    fn sales() -> Vec<Document> {
        vec![
            doc! { productId: "P1", total: 100, quantity: 1 },
            doc! { productId: "P2", total: 50, quantity: 2 },
            doc! { productId: "P1", total: 200, quantity: 3 },
        ]
    }

    #[test]
    fn groups_by_field_in_first_seen_order() {
        let stage = GroupStage::by_field("productId")
            .accumulate("totalSales", Accumulator::Sum(SumOperand::Field("total".into())))
            .accumulate("orders", Accumulator::Count);

        let out = stage.apply(sales());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get(DOC_ID), Some(&Value::from("P1")));
        assert_eq!(out[0].get("totalSales"), Some(&Value::I64(300)));
        assert_eq!(out[0].get("orders"), Some(&Value::I64(2)));
        assert_eq!(out[1].get(DOC_ID), Some(&Value::from("P2")));
        assert_eq!(out[1].get("totalSales"), Some(&Value::I64(50)));
    }

    #[test]
    fn output_fields_follow_declaration_order() {
        let stage = GroupStage::by_all()
            .accumulate("b", Accumulator::Count)
            .accumulate("a", Accumulator::Count);
        let out = stage.apply(sales());
        let keys: Vec<String> = out[0].keys().into_iter().collect();
        assert_eq!(keys, vec![DOC_ID.to_string(), "b".to_string(), "a".to_string()]);
    }

    #[test]
    fn all_key_collapses_everything() {
        let stage = GroupStage::by_all().accumulate("avgQty", Accumulator::Avg("quantity".into()));
        let out = stage.apply(sales());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get(DOC_ID), Some(&Value::from("all")));
        assert_eq!(out[0].get("avgQty"), Some(&Value::F64(2.0)));
    }

    #[test]
    fn composite_key_joins_pairs() {
        let records = vec![
            doc! { year: 2024, month: 3, total: 10 },
            doc! { year: 2024, month: 3, total: 5 },
            doc! { year: 2024, month: 4, total: 1 },
        ];
        let stage = GroupStage::new(GroupKey::Composite(vec![
            ("year".into(), "year".into()),
            ("month".into(), "month".into()),
        ]))
        .accumulate("total", Accumulator::Sum(SumOperand::Field("total".into())));

        let out = stage.apply(records);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get(DOC_ID), Some(&Value::from("year:2024_month:3")));
        assert_eq!(out[0].get("total"), Some(&Value::I64(15)));
        assert_eq!(out[1].get(DOC_ID), Some(&Value::from("year:2024_month:4")));
    }

    #[test]
    fn composite_key_renders_missing_as_null() {
        let stage = GroupStage::new(GroupKey::Composite(vec![("y".into(), "year".into())]));
        let out = stage.apply(vec![doc! { other: 1 }]);
        assert_eq!(out[0].get(DOC_ID), Some(&Value::from("y:null")));
    }

    #[test]
    fn missing_field_groups_under_null() {
        let stage = GroupStage::by_field("category").accumulate("n", Accumulator::Count);
        let out = stage.apply(vec![doc! { a: 1 }, doc! { category: "X" }, doc! { b: 2 }]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get(DOC_ID), Some(&Value::Null));
        assert_eq!(out[0].get("n"), Some(&Value::I64(2)));
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(GroupStage::by_all().apply(vec![]).is_empty());
    }
}
