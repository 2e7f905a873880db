use std::path::{Path, PathBuf};

use crate::errors::StockroomResult;
use crate::store::json::{JsonFileStore, JsonStoreConfig};
use crate::store::{RecordStore, StoreModule};

/// Opens a database on a [JsonFileStore].
///
/// ```rust,ignore
/// let module = JsonStoreModule::with_config()
///     .data_dir("/var/lib/stockroom")
///     .pretty(false)
///     .build();
/// let db = Stockroom::builder().load_module(module).open()?;
/// ```
pub struct JsonStoreModule {
    store_config: JsonStoreConfig,
}

impl JsonStoreModule {
    pub fn new(store_config: JsonStoreConfig) -> JsonStoreModule {
        JsonStoreModule { store_config }
    }

    pub fn with_config() -> JsonStoreModuleBuilder {
        JsonStoreModuleBuilder::new()
    }

    pub fn config(&self) -> &JsonStoreConfig {
        &self.store_config
    }
}

impl StoreModule for JsonStoreModule {
    fn get_store(&self) -> StockroomResult<RecordStore> {
        log::debug!(
            "Opening JSON record store in {}",
            self.store_config.data_dir().display()
        );
        Ok(RecordStore::new(JsonFileStore::new(self.store_config.clone())))
    }
}

pub struct JsonStoreModuleBuilder {
    data_dir: Option<PathBuf>,
    pretty: bool,
}

impl JsonStoreModuleBuilder {
    pub fn new() -> JsonStoreModuleBuilder {
        JsonStoreModuleBuilder {
            data_dir: None,
            pretty: true,
        }
    }

    pub fn data_dir(mut self, data_dir: impl AsRef<Path>) -> Self {
        self.data_dir = Some(data_dir.as_ref().to_path_buf());
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn build(self) -> JsonStoreModule {
        let data_dir = self
            .data_dir
            .unwrap_or_else(|| PathBuf::from(JsonStoreConfig::DEFAULT_DATA_DIR));
        JsonStoreModule::new(JsonStoreConfig::new(data_dir, self.pretty))
    }
}

impl Default for JsonStoreModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn builder_defaults() {
        let module = JsonStoreModule::with_config().build();
        assert!(module.config().pretty());
        assert_eq!(module.config().data_dir(), Path::new("data"));
    }

    #[test]
    fn stores_share_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let module = JsonStoreModule::with_config()
            .data_dir(dir.path())
            .pretty(false)
            .build();

        let first = module.get_store().unwrap();
        first.add_item("products", doc! { sku: "A" }).unwrap();

        let second = module.get_store().unwrap();
        assert_eq!(second.read_all("products").unwrap().len(), 1);
    }
}
