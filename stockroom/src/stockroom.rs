use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::common::is_valid_collection_name;
use crate::errors::{ErrorKind, StockroomError, StockroomResult};
use crate::model::{Entity, Model, Repository};
use crate::stockroom_builder::StockroomBuilder;
use crate::stockroom_config::StockroomConfig;
use crate::store::RecordStore;

/// An open database.
///
/// Hands out one [Model] per collection and one [Repository] per entity
/// type. Cloning is cheap; clones share the same store.
///
/// # Examples
///
/// ```rust,ignore
/// use stockroom::doc;
/// use stockroom::stockroom::Stockroom;
///
/// let db = Stockroom::builder().open()?;
/// let sales = db.model("sales")?;
/// sales.create(doc! { productId: "P1", total: 100 })?;
/// ```
#[derive(Clone)]
pub struct Stockroom {
    inner: Arc<StockroomInner>,
}

struct StockroomInner {
    config: StockroomConfig,
    store: RecordStore,
    closed: AtomicBool,
}

impl std::fmt::Debug for Stockroom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stockroom")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Stockroom {
    pub fn builder() -> StockroomBuilder {
        StockroomBuilder::new()
    }

    pub(crate) fn new(config: StockroomConfig) -> StockroomResult<Stockroom> {
        let store = config.record_store()?;
        config.mark_opened();
        log::debug!("Opened database with {:?} query policy", config.query_policy());
        Ok(Stockroom {
            inner: Arc::new(StockroomInner {
                config,
                store,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// The facade over the collection `name`. The collection need not exist.
    pub fn model(&self, name: &str) -> StockroomResult<Model> {
        self.ensure_open()?;
        if !is_valid_collection_name(name) {
            log::error!("Invalid collection name {:?}", name);
            return Err(StockroomError::new(
                &format!("Invalid collection name {:?}", name),
                ErrorKind::InvalidFieldName,
            ));
        }
        Ok(Model::new(
            name,
            self.inner.store.clone(),
            self.inner.config.query_policy(),
        ))
    }

    /// The typed facade over the collection of `T`.
    pub fn repository<T: Entity>(&self) -> StockroomResult<Repository<T>> {
        Ok(Repository::new(self.model(T::COLLECTION)?))
    }

    pub fn has_collection(&self, name: &str) -> StockroomResult<bool> {
        self.ensure_open()?;
        Ok(self.inner.store.collection_names()?.contains(name))
    }

    pub fn collection_names(&self) -> StockroomResult<BTreeSet<String>> {
        self.ensure_open()?;
        self.inner.store.collection_names()
    }

    /// Removes a collection and its records, returning whether it existed.
    pub fn drop_collection(&self, name: &str) -> StockroomResult<bool> {
        self.ensure_open()?;
        self.inner.store.drop_collection(name)
    }

    pub fn config(&self) -> &StockroomConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &RecordStore {
        &self.inner.store
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Closes the store. Models obtained earlier keep working on media that
    /// need no closing; new models cannot be obtained.
    pub fn close(&self) -> StockroomResult<()> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        log::debug!("Closing database");
        self.inner.store.close()
    }

    fn ensure_open(&self) -> StockroomResult<()> {
        if self.is_closed() {
            log::error!("Database is closed");
            return Err(StockroomError::new(
                "Database is closed",
                ErrorKind::StoreNotInitialized,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::RecordId;
    use crate::doc;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Supplier {
        #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
        id: Option<RecordId>,
        name: String,
    }

    impl Entity for Supplier {
        const COLLECTION: &'static str = "suppliers";

        fn entity_id(&self) -> Option<RecordId> {
            self.id.clone()
        }

        fn set_entity_id(&mut self, id: RecordId) {
            self.id = Some(id);
        }
    }

    #[test]
    fn models_share_the_store() {
        let db = Stockroom::builder().open().unwrap();
        db.model("products").unwrap().create(doc! { sku: "A" }).unwrap();
        assert_eq!(db.model("products").unwrap().count_documents(&doc! {}).unwrap(), 1);
        assert!(db.has_collection("products").unwrap());
        assert!(!db.has_collection("sales").unwrap());
    }

    #[test]
    fn repository_uses_entity_collection() {
        let db = Stockroom::builder().open().unwrap();
        let suppliers = db.repository::<Supplier>().unwrap();
        suppliers
            .create(&Supplier {
                id: None,
                name: "Acme".into(),
            })
            .unwrap();
        assert_eq!(db.model("suppliers").unwrap().count_documents(&doc! {}).unwrap(), 1);
    }

    #[test]
    fn invalid_model_name() {
        let db = Stockroom::builder().open().unwrap();
        let err = db.model("bad name").err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::InvalidFieldName);
    }

    #[test]
    fn drop_and_list_collections() {
        let db = Stockroom::builder().open().unwrap();
        db.model("a").unwrap().create(doc! {}).unwrap();
        db.model("b").unwrap().create(doc! {}).unwrap();
        let names: Vec<_> = db.collection_names().unwrap().into_iter().collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        assert!(db.drop_collection("a").unwrap());
        assert!(!db.has_collection("a").unwrap());
    }

    #[test]
    fn closed_database_refuses_models() {
        let db = Stockroom::builder().open().unwrap();
        db.close().unwrap();
        db.close().unwrap();
        assert!(db.is_closed());
        assert!(db.model("products").is_err());
    }

    #[test]
    fn handles_are_debug_printable() {
        let db = Stockroom::builder().open().unwrap();
        let model = db.model("products").unwrap();
        assert!(format!("{:?}", model).contains("products"));
        db.close().unwrap();
        assert!(format!("{:?}", db).contains("closed: true"));
        let err = db.model("products").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreNotInitialized);
    }
}
