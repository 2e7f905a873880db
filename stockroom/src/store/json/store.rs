use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind as IoErrorKind, Write};

use crate::collection::Document;
use crate::common::JSON_FILE_EXTENSION;
use crate::errors::{ErrorKind, StockroomError, StockroomResult};
use crate::store::RecordStoreProvider;

use super::JsonStoreConfig;

/// A record store keeping one JSON file per collection.
///
/// Every mutation rewrites the whole collection file. Two processes writing
/// the same data directory can still overwrite each other's changes.
#[derive(Clone)]
pub struct JsonFileStore {
    config: JsonStoreConfig,
}

impl JsonFileStore {
    pub fn new(config: JsonStoreConfig) -> JsonFileStore {
        JsonFileStore { config }
    }

    pub fn config(&self) -> &JsonStoreConfig {
        &self.config
    }
}

impl RecordStoreProvider for JsonFileStore {
    fn read_all(&self, collection: &str) -> StockroomResult<Vec<Document>> {
        let path = self.config.collection_file(collection);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == IoErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                log::error!("Failed to open {}: {}", path.display(), err);
                return Err(err.into());
            }
        };

        let records: Vec<Document> =
            serde_json::from_reader(BufReader::new(file)).map_err(|err| {
                log::error!("Failed to parse {}: {}", path.display(), err);
                StockroomError::new_with_cause(
                    &format!("Collection file {} is corrupted", path.display()),
                    ErrorKind::FileCorrupted,
                    err.into(),
                )
            })?;

        log::debug!("Read {} records from {}", records.len(), path.display());
        Ok(records)
    }

    fn write_all(&self, collection: &str, records: &[Document]) -> StockroomResult<()> {
        let path = self.config.collection_file(collection);
        let temp_path = self.config.temp_file(collection);

        let result = (|| -> StockroomResult<()> {
            fs::create_dir_all(self.config.data_dir())?;
            let mut writer = BufWriter::new(File::create(&temp_path)?);
            if self.config.pretty() {
                serde_json::to_writer_pretty(&mut writer, records)?;
            } else {
                serde_json::to_writer(&mut writer, records)?;
            }
            writer.flush()?;
            writer.get_ref().sync_all()?;
            fs::rename(&temp_path, &path)?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                log::debug!("Wrote {} records to {}", records.len(), path.display());
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to write {}: {}", path.display(), err);
                // best effort, the temp file may not exist
                let _ = fs::remove_file(&temp_path);
                Err(StockroomError::new_with_cause(
                    &format!("Failed to write collection {}", collection),
                    err.kind().clone(),
                    err,
                ))
            }
        }
    }

    fn collection_names(&self) -> StockroomResult<BTreeSet<String>> {
        let entries = match fs::read_dir(self.config.data_dir()) {
            Ok(entries) => entries,
            Err(err) if err.kind() == IoErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names = BTreeSet::new();
        for entry in entries {
            let path = entry?.path();
            let is_json = path
                .extension()
                .is_some_and(|ext| ext == JSON_FILE_EXTENSION);
            if let (true, Some(stem)) = (is_json, path.file_stem().and_then(|s| s.to_str())) {
                names.insert(stem.to_string());
            }
        }
        Ok(names)
    }

    fn drop_collection(&self, collection: &str) -> StockroomResult<bool> {
        let path = self.config.collection_file(collection);
        match fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Removed {}", path.display());
                Ok(true)
            }
            Err(err) if err.kind() == IoErrorKind::NotFound => Ok(false),
            Err(err) => {
                log::error!("Failed to remove {}: {}", path.display(), err);
                Err(err.into())
            }
        }
    }
}
