use crate::errors::StockroomResult;
use crate::store::memory::InMemoryStore;
use crate::store::{RecordStore, StoreModule};

/// Opens a database on a fresh [InMemoryStore].
#[derive(Default)]
pub struct InMemoryStoreModule;

impl InMemoryStoreModule {
    pub fn new() -> InMemoryStoreModule {
        InMemoryStoreModule
    }
}

impl StoreModule for InMemoryStoreModule {
    fn get_store(&self) -> StockroomResult<RecordStore> {
        log::debug!("Opening in-memory record store");
        Ok(RecordStore::new(InMemoryStore::new()))
    }
}
