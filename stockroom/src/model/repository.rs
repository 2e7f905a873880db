use std::marker::PhantomData;

use crate::collection::{Document, RecordId, WriteResult};
use crate::errors::StockroomResult;
use crate::filter::Filter;

use super::{from_document, to_document, Entity, Model};

/// Typed facade over the collection of `T`.
///
/// Offers the [Model] operations with entities in place of records. Filters,
/// patches and pipeline stages remain documents because they name stored
/// field names.
pub struct Repository<T: Entity> {
    model: Model,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> std::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("collection", &T::COLLECTION)
            .finish_non_exhaustive()
    }
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Repository {
            model: self.model.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub(crate) fn new(model: Model) -> Self {
        Repository {
            model,
            _entity: PhantomData,
        }
    }

    /// The untyped facade over the same collection.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Stores `entity` under a fresh identifier and returns the stored copy.
    pub fn create(&self, entity: &T) -> StockroomResult<T> {
        from_document(self.model.create(to_document(entity)?)?)
    }

    /// Stores a new entity unless a stored one shares a value of
    /// `unique_fields`, named as stored.
    pub fn create_unique(&self, entity: &T, unique_fields: &[&str]) -> StockroomResult<T> {
        from_document(self.model.create_unique(to_document(entity)?, unique_fields)?)
    }

    /// Replaces the stored entity with the same identifier, or stores it as
    /// new (keeping its identifier, or assigning one) when there is none.
    pub fn save(&self, entity: &T) -> StockroomResult<T> {
        let document = to_document(entity)?;
        let Some(id) = entity.entity_id() else {
            return self.create(entity);
        };

        let replaced = self.model.find_by_id_and_modify(&id, |record| {
            *record = document.clone();
            Ok(())
        })?;
        match replaced {
            Some(record) => from_document(record),
            None => from_document(self.model.insert(document)?),
        }
    }

    pub fn find(&self, filter: &Document) -> StockroomResult<Vec<T>> {
        self.model.find(filter)?.into_iter().map(from_document).collect()
    }

    pub fn find_by(&self, filter: &Filter) -> StockroomResult<Vec<T>> {
        self.model.find_by(filter)?.into_iter().map(from_document).collect()
    }

    pub fn find_one(&self, filter: &Document) -> StockroomResult<Option<T>> {
        self.model.find_one(filter)?.map(from_document).transpose()
    }

    pub fn find_one_by(&self, filter: &Filter) -> StockroomResult<Option<T>> {
        self.model.find_one_by(filter)?.map(from_document).transpose()
    }

    pub fn find_by_id(&self, id: &RecordId) -> StockroomResult<Option<T>> {
        self.model.find_by_id(id)?.map(from_document).transpose()
    }

    pub fn find_by_id_and_update(
        &self,
        id: &RecordId,
        patch: &Document,
    ) -> StockroomResult<Option<T>> {
        self.model
            .find_by_id_and_update(id, patch)?
            .map(from_document)
            .transpose()
    }

    /// Loads the entity, lets `modify` change it and stores the result, all
    /// under the collection lock. An error from `modify` stores nothing.
    pub fn find_by_id_and_modify<F>(&self, id: &RecordId, modify: F) -> StockroomResult<Option<T>>
    where
        F: FnOnce(&mut T) -> StockroomResult<()>,
    {
        self.find_by_id_and_modify_unique(id, &[], modify)
    }

    pub fn find_by_id_and_modify_unique<F>(
        &self,
        id: &RecordId,
        unique_fields: &[&str],
        modify: F,
    ) -> StockroomResult<Option<T>>
    where
        F: FnOnce(&mut T) -> StockroomResult<()>,
    {
        self.model
            .find_by_id_and_modify_unique(id, unique_fields, |record| {
                let mut entity: T = from_document(record.clone())?;
                modify(&mut entity)?;
                *record = to_document(&entity)?;
                Ok(())
            })?
            .map(from_document)
            .transpose()
    }

    pub fn find_by_id_and_delete(&self, id: &RecordId) -> StockroomResult<bool> {
        self.model.find_by_id_and_delete(id)
    }

    pub fn count_documents(&self, filter: &Document) -> StockroomResult<usize> {
        self.model.count_documents(filter)
    }

    pub fn update_one(&self, filter: &Document, patch: &Document) -> StockroomResult<Option<T>> {
        self.model
            .update_one(filter, patch)?
            .map(from_document)
            .transpose()
    }

    pub fn update_many(&self, filter: &Document, patch: &Document) -> StockroomResult<WriteResult> {
        self.model.update_many(filter, patch)
    }

    pub fn delete_one(&self, filter: &Document) -> StockroomResult<bool> {
        self.model.delete_one(filter)
    }

    pub fn delete_many(&self, filter: &Document) -> StockroomResult<WriteResult> {
        self.model.delete_many(filter)
    }

    /// Pipeline output rarely has the shape of `T`, so it stays untyped.
    pub fn aggregate(&self, pipeline: &[Document]) -> StockroomResult<Vec<Document>> {
        self.model.aggregate(pipeline)
    }

    /// Resolves the reference at `path` in `entity`. The result embeds
    /// another record, so it is returned as a document.
    pub fn populate(&self, entity: &T, path: &str) -> StockroomResult<Document> {
        self.model.populate(to_document(entity)?, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use crate::doc;
    use crate::errors::ErrorKind;
    use crate::filter::QueryPolicy;
    use crate::store::memory::InMemoryStore;
    use crate::store::RecordStore;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Location {
        #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
        id: Option<RecordId>,
        code: String,
        #[serde(rename = "isActive")]
        is_active: bool,
    }

    impl Entity for Location {
        const COLLECTION: &'static str = "locations";

        fn entity_id(&self) -> Option<RecordId> {
            self.id.clone()
        }

        fn set_entity_id(&mut self, id: RecordId) {
            self.id = Some(id);
        }
    }

    fn location(code: &str) -> Location {
        Location {
            id: None,
            code: code.to_string(),
            is_active: true,
        }
    }

    fn repository() -> Repository<Location> {
        let store = RecordStore::new(InMemoryStore::new());
        Repository::new(Model::new(Location::COLLECTION, store, QueryPolicy::Lenient))
    }

    #[test]
    fn create_assigns_id() {
        let repo = repository();
        let created = repo.create(&location("WH-1")).unwrap();
        let id = created.entity_id().unwrap();
        assert_eq!(repo.find_by_id(&id).unwrap(), Some(created));
    }

    #[test]
    fn find_typed() {
        let repo = repository();
        repo.create(&location("WH-1")).unwrap();
        repo.create(&location("ST-1")).unwrap();
        let found = repo.find(&doc! { code: "ST-1" }).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code, "ST-1");
    }

    #[test]
    fn save_replaces_or_inserts() {
        let repo = repository();
        let mut created = repo.create(&location("WH-1")).unwrap();
        created.is_active = false;
        let saved = repo.save(&created).unwrap();
        assert_eq!(saved, created);
        assert_eq!(repo.count_documents(&doc! {}).unwrap(), 1);

        let mut fresh = location("WH-2");
        fresh.set_entity_id(RecordId::from("given"));
        let saved = repo.save(&fresh).unwrap();
        assert_eq!(saved.entity_id(), Some(RecordId::from("given")));
        assert_eq!(repo.count_documents(&doc! {}).unwrap(), 2);
    }

    #[test]
    fn modify_typed() {
        let repo = repository();
        let id = repo.create(&location("WH-1")).unwrap().entity_id().unwrap();
        let modified = repo
            .find_by_id_and_modify(&id, |loc| {
                loc.code = "WH-9".into();
                Ok(())
            })
            .unwrap()
            .unwrap();
        assert_eq!(modified.code, "WH-9");
        assert_eq!(modified.entity_id(), Some(id));
    }

    #[test]
    fn patch_with_wrong_shape_fails_to_map() {
        let repo = repository();
        let id = repo.create(&location("WH-1")).unwrap().entity_id().unwrap();
        let err = repo
            .find_by_id_and_update(&id, &doc! { isActive: "nope" })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
        // the patch itself was stored
        let raw = repo.model().find_by_id(&id).unwrap().unwrap();
        assert_eq!(raw.get("isActive"), Some(&Value::from("nope")));
    }
}
