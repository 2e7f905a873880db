use crate::aggregate::Pipeline;
use crate::collection::{Document, RecordId, WriteResult};
use crate::errors::StockroomResult;
use crate::filter::{Filter, FilterParser, QueryPolicy};
use crate::store::RecordStore;

use super::{populate_records, PopulatePath};

/// Untyped facade over one collection.
///
/// Cheap to clone. Filters are documents in the form described in
/// [crate::filter]; the `_by` variants accept a prebuilt [Filter] instead.
///
/// Operations addressed by identifier report a missing record as `None`,
/// `false` or an empty [WriteResult], never as an error.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    store: RecordStore,
    parser: FilterParser,
}

impl Model {
    pub(crate) fn new(name: &str, store: RecordStore, policy: QueryPolicy) -> Self {
        Model {
            name: name.to_string(),
            store,
            parser: FilterParser::new(policy),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> QueryPolicy {
        self.parser.policy()
    }

    /// Stores `record` under a freshly generated identifier, replacing any
    /// `_id` it carried, and returns it as stored.
    pub fn create(&self, record: Document) -> StockroomResult<Document> {
        self.create_unique(record, &[])
    }

    /// [create](Self::create) that fails with a unique constraint violation
    /// when a stored record holds the same value in one of `unique_fields`.
    pub fn create_unique(
        &self,
        mut record: Document,
        unique_fields: &[&str],
    ) -> StockroomResult<Document> {
        record.set_id(&RecordId::new());
        self.store.add_unique_item(&self.name, record, unique_fields)
    }

    /// Stores `record` keeping the `_id` it carries, or assigning one when it
    /// has none. Fails with a unique constraint violation when the identifier
    /// is taken.
    pub fn insert(&self, record: Document) -> StockroomResult<Document> {
        self.store.add_item(&self.name, record)
    }

    pub fn find(&self, filter: &Document) -> StockroomResult<Vec<Document>> {
        self.find_by(&self.parser.parse(filter)?)
    }

    pub fn find_by(&self, filter: &Filter) -> StockroomResult<Vec<Document>> {
        filter.select(self.store.read_all(&self.name)?)
    }

    /// First match in store order, see the module notes on ordering.
    pub fn find_one(&self, filter: &Document) -> StockroomResult<Option<Document>> {
        self.find_one_by(&self.parser.parse(filter)?)
    }

    pub fn find_one_by(&self, filter: &Filter) -> StockroomResult<Option<Document>> {
        for record in self.store.read_all(&self.name)? {
            if filter.apply(&record)? {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    pub fn find_by_id(&self, id: &RecordId) -> StockroomResult<Option<Document>> {
        self.store.find_by_id(&self.name, id)
    }

    /// Shallow-patches the record and returns it as stored after the update.
    pub fn find_by_id_and_update(
        &self,
        id: &RecordId,
        patch: &Document,
    ) -> StockroomResult<Option<Document>> {
        self.store.update_item(&self.name, id, patch)
    }

    /// Read-modify-write of one record under the collection lock.
    pub fn find_by_id_and_modify<F>(
        &self,
        id: &RecordId,
        modify: F,
    ) -> StockroomResult<Option<Document>>
    where
        F: FnOnce(&mut Document) -> StockroomResult<()>,
    {
        self.find_by_id_and_modify_unique(id, &[], modify)
    }

    /// [find_by_id_and_modify](Self::find_by_id_and_modify) that rejects a
    /// change giving the record the value of another record in one of
    /// `unique_fields`.
    pub fn find_by_id_and_modify_unique<F>(
        &self,
        id: &RecordId,
        unique_fields: &[&str],
        modify: F,
    ) -> StockroomResult<Option<Document>>
    where
        F: FnOnce(&mut Document) -> StockroomResult<()>,
    {
        self.store.modify_unique_item(&self.name, id, unique_fields, modify)
    }

    pub fn find_by_id_and_delete(&self, id: &RecordId) -> StockroomResult<bool> {
        self.store.delete_item(&self.name, id)
    }

    pub fn count_documents(&self, filter: &Document) -> StockroomResult<usize> {
        self.count_documents_by(&self.parser.parse(filter)?)
    }

    pub fn count_documents_by(&self, filter: &Filter) -> StockroomResult<usize> {
        let mut count = 0;
        for record in self.store.read_all(&self.name)? {
            if filter.apply(&record)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Patches the first match, see the module notes on ordering.
    pub fn update_one(
        &self,
        filter: &Document,
        patch: &Document,
    ) -> StockroomResult<Option<Document>> {
        self.update_one_by(&self.parser.parse(filter)?, patch)
    }

    pub fn update_one_by(
        &self,
        filter: &Filter,
        patch: &Document,
    ) -> StockroomResult<Option<Document>> {
        let mut updated = self.store.update_matching(&self.name, filter, patch, Some(1))?;
        Ok(updated.pop())
    }

    pub fn update_many(&self, filter: &Document, patch: &Document) -> StockroomResult<WriteResult> {
        self.update_many_by(&self.parser.parse(filter)?, patch)
    }

    pub fn update_many_by(
        &self,
        filter: &Filter,
        patch: &Document,
    ) -> StockroomResult<WriteResult> {
        let updated = self.store.update_matching(&self.name, filter, patch, None)?;
        Ok(WriteResult::new(
            updated.iter().filter_map(|record| record.id()).collect(),
        ))
    }

    /// Removes the first match, see the module notes on ordering.
    pub fn delete_one(&self, filter: &Document) -> StockroomResult<bool> {
        self.delete_one_by(&self.parser.parse(filter)?)
    }

    pub fn delete_one_by(&self, filter: &Filter) -> StockroomResult<bool> {
        let result = self.store.delete_matching(&self.name, filter, Some(1))?;
        Ok(!result.is_empty())
    }

    pub fn delete_many(&self, filter: &Document) -> StockroomResult<WriteResult> {
        self.delete_many_by(&self.parser.parse(filter)?)
    }

    pub fn delete_many_by(&self, filter: &Filter) -> StockroomResult<WriteResult> {
        self.store.delete_matching(&self.name, filter, None)
    }

    /// Runs a pipeline written as stage documents over the whole collection.
    pub fn aggregate(&self, pipeline: &[Document]) -> StockroomResult<Vec<Document>> {
        self.aggregate_with(&Pipeline::parse(pipeline, self.policy())?)
    }

    pub fn aggregate_with(&self, pipeline: &Pipeline) -> StockroomResult<Vec<Document>> {
        pipeline.execute(self.store.read_all(&self.name)?)
    }

    /// Resolves the reference at `path` (`<collection>.<field>`) in `record`.
    pub fn populate(&self, record: Document, path: &str) -> StockroomResult<Document> {
        let path = PopulatePath::parse(path)?;
        let mut populated = populate_records(&self.store, vec![record], &path)?;
        Ok(populated.pop().unwrap_or_default())
    }

    /// Resolves the reference at `path` in every record independently.
    pub fn populate_all(
        &self,
        records: Vec<Document>,
        path: &str,
    ) -> StockroomResult<Vec<Document>> {
        let path = PopulatePath::parse(path)?;
        populate_records(&self.store, records, &path)
    }
}
