use std::cmp::Ordering;

use crate::collection::Document;
use crate::common::SortOrder;

/// A stable multi-key sort.
///
/// Keys are compared in declaration order; the first key that tells two
/// records apart decides. Records lacking a key sort before records that
/// have it, values of different types order by type (null, booleans,
/// numbers, strings, arrays, documents) and records equal on every key
/// keep their relative order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SortStage {
    keys: Vec<(String, SortOrder)>,
}

impl SortStage {
    pub fn new() -> Self {
        SortStage::default()
    }

    pub fn by(mut self, field: &str, order: SortOrder) -> Self {
        self.keys.push((field.to_string(), order));
        self
    }

    pub fn keys(&self) -> &[(String, SortOrder)] {
        &self.keys
    }

    fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for (field, order) in &self.keys {
            let ordering = a.get(field).cmp(&b.get(field));
            let ordering = match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    pub(crate) fn apply(&self, mut records: Vec<Document>) -> Vec<Document> {
        if !self.keys.is_empty() {
            records.sort_by(|a, b| self.compare(a, b));
        }
        records
    }
}
