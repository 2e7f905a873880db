use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::collection::{Document, RecordId, WriteResult};
use crate::common::{is_valid_collection_name, LockRegistry, Value};
use crate::errors::{ErrorKind, StockroomError, StockroomResult};
use crate::filter::Filter;

/// A durable medium holding named collections of records.
///
/// Only [read_all](RecordStoreProvider::read_all) and
/// [write_all](RecordStoreProvider::write_all) are required. The per-record
/// operations default to a full read followed by a full rewrite; media that
/// can address single records override them.
///
/// Implementations may assume collection names are valid and that records
/// handed to them carry unique identifiers; [RecordStore] checks both.
pub trait RecordStoreProvider: Send + Sync {
    /// Returns every record of `collection` in insertion order. A collection
    /// that does not exist yet reads as empty.
    fn read_all(&self, collection: &str) -> StockroomResult<Vec<Document>>;

    /// Replaces the whole contents of `collection`.
    fn write_all(&self, collection: &str, records: &[Document]) -> StockroomResult<()>;

    fn collection_names(&self) -> StockroomResult<BTreeSet<String>>;

    /// Removes a collection, returning whether it existed.
    fn drop_collection(&self, collection: &str) -> StockroomResult<bool>;

    fn find_by_id(&self, collection: &str, id: &RecordId) -> StockroomResult<Option<Document>> {
        Ok(self
            .read_all(collection)?
            .into_iter()
            .find(|record| record.id().as_ref() == Some(id)))
    }

    /// Appends one record.
    fn insert_item(&self, collection: &str, record: &Document) -> StockroomResult<()> {
        let mut records = self.read_all(collection)?;
        records.push(record.clone());
        self.write_all(collection, &records)
    }

    /// Replaces stored records by identifier, keeping their positions.
    /// Records whose identifier is not stored are ignored.
    fn replace_items(&self, collection: &str, records: &[Document]) -> StockroomResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let replacements: HashMap<RecordId, &Document> = records
            .iter()
            .filter_map(|record| record.id().map(|id| (id, record)))
            .collect();

        let mut stored = self.read_all(collection)?;
        for existing in stored.iter_mut() {
            if let Some(replacement) = existing.id().and_then(|id| replacements.get(&id)) {
                *existing = (*replacement).clone();
            }
        }
        self.write_all(collection, &stored)
    }

    /// Removes records by identifier, returning how many were removed.
    fn remove_items(&self, collection: &str, ids: &[RecordId]) -> StockroomResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut stored = self.read_all(collection)?;
        let before = stored.len();
        stored.retain(|record| !matches!(record.id(), Some(id) if ids.contains(&id)));

        let removed = before - stored.len();
        if removed > 0 {
            self.write_all(collection, &stored)?;
        }
        Ok(removed)
    }

    fn close(&self) -> StockroomResult<()> {
        Ok(())
    }
}

/// Shared handle to a record store medium.
///
/// Cloning is cheap. Every operation validates the collection name; every
/// mutation runs under the collection's write lock so read-modify-write
/// cycles within one process never lose updates.
#[derive(Clone)]
pub struct RecordStore {
    inner: Arc<dyn RecordStoreProvider>,
    locks: LockRegistry,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore").finish_non_exhaustive()
    }
}

impl RecordStore {
    pub fn new<T: RecordStoreProvider + 'static>(inner: T) -> Self {
        RecordStore {
            inner: Arc::new(inner),
            locks: LockRegistry::new(),
        }
    }

    pub fn read_all(&self, collection: &str) -> StockroomResult<Vec<Document>> {
        validate_collection_name(collection)?;
        let lock = self.locks.get_lock(collection);
        let _guard = lock.read();
        self.inner.read_all(collection)
    }

    /// Replaces the whole collection. Every record must carry an identifier
    /// and identifiers must be unique.
    pub fn write_all(&self, collection: &str, records: Vec<Document>) -> StockroomResult<()> {
        validate_collection_name(collection)?;
        validate_identifiers(collection, &records)?;
        let lock = self.locks.get_lock(collection);
        let _guard = lock.write();
        self.inner.write_all(collection, &records)
    }

    /// Stores a new record, assigning an identifier when it has none.
    /// Returns the record as stored.
    pub fn add_item(&self, collection: &str, record: Document) -> StockroomResult<Document> {
        self.add_unique_item(collection, record, &[])
    }

    /// Stores a new record like [add_item](Self::add_item) unless a stored
    /// record holds the same value in one of `unique_fields`. Missing and null
    /// values never clash. The check and the insert share one write lock.
    pub fn add_unique_item(
        &self,
        collection: &str,
        mut record: Document,
        unique_fields: &[&str],
    ) -> StockroomResult<Document> {
        validate_collection_name(collection)?;
        let id = match record.id() {
            Some(id) => id,
            None => {
                let id = RecordId::new();
                record.set_id(&id);
                id
            }
        };

        let lock = self.locks.get_lock(collection);
        let _guard = lock.write();
        if self.inner.find_by_id(collection, &id)?.is_some() {
            log::error!("Record {} already exists in {}", id, collection);
            return Err(StockroomError::new(
                &format!("Record {} already exists in {}", id, collection),
                ErrorKind::UniqueConstraintViolation,
            ));
        }
        self.check_unique(collection, &id, &record, unique_fields)?;

        self.inner.insert_item(collection, &record)?;
        log::debug!("Added record {} to {}", id, collection);
        Ok(record)
    }

    pub fn find_by_id(&self, collection: &str, id: &RecordId) -> StockroomResult<Option<Document>> {
        validate_collection_name(collection)?;
        let lock = self.locks.get_lock(collection);
        let _guard = lock.read();
        self.inner.find_by_id(collection, id)
    }

    /// Applies a shallow patch to the record with `id` and returns the merged
    /// record, or `None` when no such record exists. The identifier is never
    /// changed by the patch.
    pub fn update_item(
        &self,
        collection: &str,
        id: &RecordId,
        patch: &Document,
    ) -> StockroomResult<Option<Document>> {
        self.modify_item(collection, id, |record| {
            record.patch(patch);
            Ok(())
        })
    }

    /// Runs `modify` on the record with `id` and stores the result, all under
    /// the collection's write lock. Returns `None` when no such record exists;
    /// `modify` is not called then. An error from `modify` leaves the record
    /// unchanged.
    pub fn modify_item<F>(
        &self,
        collection: &str,
        id: &RecordId,
        modify: F,
    ) -> StockroomResult<Option<Document>>
    where
        F: FnOnce(&mut Document) -> StockroomResult<()>,
    {
        self.modify_unique_item(collection, id, &[], modify)
    }

    /// [modify_item](Self::modify_item) that also fails with a unique
    /// constraint violation, leaving the record unchanged, when the modified
    /// record holds the value of another record in one of `unique_fields`.
    pub fn modify_unique_item<F>(
        &self,
        collection: &str,
        id: &RecordId,
        unique_fields: &[&str],
        modify: F,
    ) -> StockroomResult<Option<Document>>
    where
        F: FnOnce(&mut Document) -> StockroomResult<()>,
    {
        validate_collection_name(collection)?;
        let lock = self.locks.get_lock(collection);
        let _guard = lock.write();

        let Some(mut record) = self.inner.find_by_id(collection, id)? else {
            return Ok(None);
        };
        modify(&mut record)?;
        // the identifier is fixed for the life of a record
        record.set_id(id);
        self.check_unique(collection, id, &record, unique_fields)?;

        self.inner.replace_items(collection, std::slice::from_ref(&record))?;
        Ok(Some(record))
    }

    /// Removes the record with `id`, returning whether one was removed.
    pub fn delete_item(&self, collection: &str, id: &RecordId) -> StockroomResult<bool> {
        validate_collection_name(collection)?;
        let lock = self.locks.get_lock(collection);
        let _guard = lock.write();
        let removed = self.inner.remove_items(collection, std::slice::from_ref(id))?;
        Ok(removed > 0)
    }

    /// Patches the records matching `filter`, at most `limit` of them when a
    /// limit is given, in store order. Returns the updated records.
    pub fn update_matching(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Document,
        limit: Option<usize>,
    ) -> StockroomResult<Vec<Document>> {
        validate_collection_name(collection)?;
        let lock = self.locks.get_lock(collection);
        let _guard = lock.write();

        let mut matched = filter.select(self.inner.read_all(collection)?)?;
        if let Some(limit) = limit {
            matched.truncate(limit);
        }
        for record in matched.iter_mut() {
            record.patch(patch);
        }

        self.inner.replace_items(collection, &matched)?;
        log::debug!("Updated {} records in {}", matched.len(), collection);
        Ok(matched)
    }

    /// Removes the records matching `filter`, at most `limit` of them when a
    /// limit is given, in store order.
    pub fn delete_matching(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> StockroomResult<WriteResult> {
        validate_collection_name(collection)?;
        let lock = self.locks.get_lock(collection);
        let _guard = lock.write();

        let matched = filter.select(self.inner.read_all(collection)?)?;
        let ids: Vec<RecordId> = matched
            .iter()
            .filter_map(|record| record.id())
            .take(limit.unwrap_or(usize::MAX))
            .collect();

        self.inner.remove_items(collection, &ids)?;
        log::debug!("Removed {} records from {}", ids.len(), collection);
        Ok(WriteResult::new(ids))
    }

    pub fn collection_names(&self) -> StockroomResult<BTreeSet<String>> {
        self.inner.collection_names()
    }

    pub fn drop_collection(&self, collection: &str) -> StockroomResult<bool> {
        validate_collection_name(collection)?;
        let dropped = {
            let lock = self.locks.get_lock(collection);
            let _guard = lock.write();
            self.inner.drop_collection(collection)?
        };
        self.locks.remove_lock(collection);
        Ok(dropped)
    }

    pub fn close(&self) -> StockroomResult<()> {
        self.inner.close()
    }

    // callers hold the collection's write lock
    fn check_unique(
        &self,
        collection: &str,
        id: &RecordId,
        record: &Document,
        unique_fields: &[&str],
    ) -> StockroomResult<()> {
        let values: Vec<(&str, &Value)> = unique_fields
            .iter()
            .filter_map(|field| {
                record
                    .get(field)
                    .filter(|value| !value.is_null())
                    .map(|value| (*field, value))
            })
            .collect();
        if values.is_empty() {
            return Ok(());
        }

        for stored in self.inner.read_all(collection)? {
            if stored.id().as_ref() == Some(id) {
                continue;
            }
            if let Some((field, value)) = values
                .iter()
                .find(|(field, value)| stored.get(field) == Some(*value))
            {
                log::error!("Value {} of {} already exists in {}", value, field, collection);
                return Err(StockroomError::new(
                    &format!("Value {} of {} already exists in {}", value, field, collection),
                    ErrorKind::UniqueConstraintViolation,
                ));
            }
        }
        Ok(())
    }
}

fn validate_collection_name(collection: &str) -> StockroomResult<()> {
    if is_valid_collection_name(collection) {
        Ok(())
    } else {
        log::error!("Invalid collection name {:?}", collection);
        Err(StockroomError::new(
            &format!("Invalid collection name {:?}", collection),
            ErrorKind::InvalidFieldName,
        ))
    }
}

fn validate_identifiers(collection: &str, records: &[Document]) -> StockroomResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        let Some(id) = record.id() else {
            log::error!("Record without an identifier written to {}", collection);
            return Err(StockroomError::new(
                &format!("Record without an identifier written to {}", collection),
                ErrorKind::NotIdentifiable,
            ));
        };
        if !seen.insert(id.clone()) {
            log::error!("Duplicate record {} written to {}", id, collection);
            return Err(StockroomError::new(
                &format!("Duplicate record {} written to {}", id, collection),
                ErrorKind::UniqueConstraintViolation,
            ));
        }
    }
    Ok(())
}
