use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::errors::{ErrorKind, StockroomError, StockroomResult};
use crate::filter::QueryPolicy;
use crate::store::memory::InMemoryStoreModule;
use crate::store::{RecordStore, StoreModule};

/// Configuration of a [Stockroom](crate::stockroom::Stockroom) database.
///
/// Cloning is cheap; clones share state. Settings are fixed once the
/// database opens.
#[derive(Clone, Default)]
pub struct StockroomConfig {
    inner: Arc<StockroomConfigInner>,
}

impl StockroomConfig {
    pub fn new() -> Self {
        StockroomConfig::default()
    }

    pub fn query_policy(&self) -> QueryPolicy {
        *self.inner.query_policy.read()
    }

    pub fn set_query_policy(&self, policy: QueryPolicy) -> StockroomResult<()> {
        self.ensure_not_configured("query policy")?;
        *self.inner.query_policy.write() = policy;
        Ok(())
    }

    /// Opens the record store of `module`. Only one store module may be
    /// loaded.
    pub fn load_module<T: StoreModule>(&self, module: T) -> StockroomResult<()> {
        if self.inner.store.get().is_some() {
            log::error!("A store module is already loaded");
            return Err(StockroomError::new(
                "A store module is already loaded",
                ErrorKind::InvalidOperation,
            ));
        }

        let store = module.get_store()?;
        self.inner.store.set(store).map_err(|_| {
            StockroomError::new("A store module is already loaded", ErrorKind::InvalidOperation)
        })
    }

    /// Falls back to the in-memory store when no module was loaded.
    pub fn auto_configure(&self) -> StockroomResult<()> {
        if self.inner.store.get().is_none() {
            log::debug!("No store module loaded, using the in-memory store");
            self.load_module(InMemoryStoreModule::new())?;
        }
        Ok(())
    }

    pub fn record_store(&self) -> StockroomResult<RecordStore> {
        match self.inner.store.get() {
            Some(store) => Ok(store.clone()),
            None => {
                log::error!("Record store is not initialized");
                Err(StockroomError::new(
                    "Record store is not initialized",
                    ErrorKind::StoreNotInitialized,
                ))
            }
        }
    }

    pub(crate) fn mark_opened(&self) {
        self.inner.opened.store(true, Ordering::Release);
    }

    fn ensure_not_configured(&self, setting: &str) -> StockroomResult<()> {
        if self.inner.opened.load(Ordering::Acquire) {
            log::error!("Cannot change the {} of an open database", setting);
            return Err(StockroomError::new(
                &format!("Cannot change the {} of an open database", setting),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}

#[derive(Default)]
struct StockroomConfigInner {
    query_policy: RwLock<QueryPolicy>,
    store: OnceLock<RecordStore>,
    opened: AtomicBool,
}
