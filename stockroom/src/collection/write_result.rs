use crate::collection::RecordId;

/// The result of a bulk write (`update_many`, `delete_many`).
///
/// Holds the identifiers of the records that were touched, in collection
/// order. A write that matched nothing is an empty result, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    record_ids: Vec<RecordId>,
}

impl WriteResult {
    pub fn new(record_ids: Vec<RecordId>) -> Self {
        Self { record_ids }
    }

    pub fn affected_record_ids(&self) -> &[RecordId] {
        &self.record_ids
    }

    /// Number of affected records.
    pub fn count(&self) -> usize {
        self.record_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_ids.is_empty()
    }
}

impl IntoIterator for WriteResult {
    type Item = RecordId;
    type IntoIter = std::vec::IntoIter<RecordId>;

    fn into_iter(self) -> Self::IntoIter {
        self.record_ids.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_affected_ids() {
        let result = WriteResult::new(vec![RecordId::from("1"), RecordId::from("2")]);
        assert_eq!(result.count(), 2);
        assert_eq!(result.affected_record_ids()[0].as_str(), "1");
    }

    #[test]
    fn default_is_empty() {
        let result = WriteResult::default();
        assert!(result.is_empty());
        assert_eq!(result.into_iter().count(), 0);
    }
}
