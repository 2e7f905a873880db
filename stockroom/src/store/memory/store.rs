use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::collection::{Document, RecordId};
use crate::errors::StockroomResult;
use crate::store::RecordStoreProvider;

/// A record store that keeps every collection in process memory.
///
/// Contents are lost when the last handle is dropped. Used as the default
/// medium and in tests.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore::default()
    }
}

impl RecordStoreProvider for InMemoryStore {
    fn read_all(&self, collection: &str) -> StockroomResult<Vec<Document>> {
        Ok(self.inner.read_all(collection))
    }

    fn write_all(&self, collection: &str, records: &[Document]) -> StockroomResult<()> {
        self.inner.write_all(collection, records);
        Ok(())
    }

    fn collection_names(&self) -> StockroomResult<BTreeSet<String>> {
        Ok(self.inner.collection_names())
    }

    fn drop_collection(&self, collection: &str) -> StockroomResult<bool> {
        Ok(self.inner.collections.remove(collection).is_some())
    }

    fn find_by_id(&self, collection: &str, id: &RecordId) -> StockroomResult<Option<Document>> {
        Ok(self.inner.collections.get(collection).and_then(|records| {
            records
                .iter()
                .find(|record| record.id().as_ref() == Some(id))
                .cloned()
        }))
    }

    fn insert_item(&self, collection: &str, record: &Document) -> StockroomResult<()> {
        self.inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryStoreInner {
    collections: DashMap<String, Vec<Document>>,
}

impl InMemoryStoreInner {
    fn read_all(&self, collection: &str) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|records| records.value().clone())
            .unwrap_or_default()
    }

    fn write_all(&self, collection: &str, records: &[Document]) {
        self.collections
            .insert(collection.to_string(), records.to_vec());
    }

    fn collection_names(&self) -> BTreeSet<String> {
        self.collections
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }
}
