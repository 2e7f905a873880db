use crate::config::FjallConfig;
use crate::store::FjallStore;
use stockroom::errors::StockroomResult;
use stockroom::store::{RecordStore, StoreModule};

/// Opens a database on a [FjallStore].
pub struct FjallModule {
    store_config: FjallConfig,
}

impl FjallModule {
    #[inline]
    pub fn with_config() -> FjallModuleBuilder {
        FjallModuleBuilder::new()
    }

    pub fn config(&self) -> &FjallConfig {
        &self.store_config
    }
}

impl StoreModule for FjallModule {
    fn get_store(&self) -> StockroomResult<RecordStore> {
        let store = FjallStore::open(self.store_config.clone())?;
        Ok(RecordStore::new(store))
    }
}

pub struct FjallModuleBuilder {
    store_config: FjallConfig,
}

impl FjallModuleBuilder {
    #[inline]
    pub fn new() -> FjallModuleBuilder {
        FjallModuleBuilder {
            store_config: FjallConfig::new(),
        }
    }

    #[inline]
    pub fn db_path(self, db_path: &str) -> Self {
        self.store_config.set_db_path(db_path);
        self
    }

    /// Block cache capacity in bytes.
    #[inline]
    pub fn cache_size(self, bytes: u64) -> Self {
        self.store_config.set_cache_size(bytes);
        self
    }

    #[inline]
    pub fn fsync_on_write(self, v: bool) -> Self {
        self.store_config.set_fsync_on_write(v);
        self
    }

    #[inline]
    pub fn build(self) -> FjallModule {
        FjallModule {
            store_config: self.store_config,
        }
    }
}

impl Default for FjallModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}
