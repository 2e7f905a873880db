use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::common::{JSON_FILE_EXTENSION, TEMP_FILE_SUFFIX};

/// Settings of a [JsonFileStore](super::JsonFileStore).
///
/// Cloning is cheap; clones share the same settings.
#[derive(Clone, Debug)]
pub struct JsonStoreConfig {
    inner: Arc<JsonStoreConfigInner>,
}

#[derive(Debug)]
struct JsonStoreConfigInner {
    data_dir: PathBuf,
    pretty: bool,
}

impl JsonStoreConfig {
    pub const DEFAULT_DATA_DIR: &'static str = "data";

    pub fn new(data_dir: impl AsRef<Path>, pretty: bool) -> JsonStoreConfig {
        JsonStoreConfig {
            inner: Arc::new(JsonStoreConfigInner {
                data_dir: data_dir.as_ref().to_path_buf(),
                pretty,
            }),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.inner.data_dir
    }

    /// Whether collection files are written indented.
    pub fn pretty(&self) -> bool {
        self.inner.pretty
    }

    pub(crate) fn collection_file(&self, collection: &str) -> PathBuf {
        self.inner
            .data_dir
            .join(format!("{}.{}", collection, JSON_FILE_EXTENSION))
    }

    pub(crate) fn temp_file(&self, collection: &str) -> PathBuf {
        self.inner.data_dir.join(format!(
            "{}.{}.{}",
            collection, JSON_FILE_EXTENSION, TEMP_FILE_SUFFIX
        ))
    }
}

impl Default for JsonStoreConfig {
    fn default() -> Self {
        JsonStoreConfig::new(Self::DEFAULT_DATA_DIR, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        let config = JsonStoreConfig::new("/tmp/stock", false);
        assert_eq!(config.collection_file("products"), PathBuf::from("/tmp/stock/products.json"));
        assert_eq!(config.temp_file("products"), PathBuf::from("/tmp/stock/products.json.tmp"));
        assert!(!config.pretty());
    }

    #[test]
    fn default_is_pretty_in_data_dir() {
        let config = JsonStoreConfig::default();
        assert!(config.pretty());
        assert_eq!(config.data_dir(), Path::new("data"));
    }
}
