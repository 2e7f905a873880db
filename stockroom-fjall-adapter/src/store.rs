use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use fjall::{Batch, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use stockroom::collection::{Document, RecordId};
use stockroom::errors::{ErrorKind, StockroomError, StockroomResult};
use stockroom::store::RecordStoreProvider;

use crate::config::FjallConfig;
use crate::version::fjall_version;
use crate::wrapper::{decode_sequence, encode_sequence, to_stockroom_error, FjallRecordError};

const ID_PARTITION_SUFFIX: &str = "#ids";

/// Record store on a fjall keyspace.
///
/// Each collection owns two partitions: `<name>` maps an insertion sequence
/// to the JSON encoded record, and `<name>#ids` maps a record identifier to
/// its sequence. Iterating the first partition yields records in insertion
/// order; the second gives point lookups by identifier.
#[derive(Clone)]
pub struct FjallStore {
    inner: Arc<FjallStoreInner>,
}

impl FjallStore {
    pub fn open(config: FjallConfig) -> StockroomResult<FjallStore> {
        if config.db_path().is_empty() {
            log::error!("Fjall store requires a db_path");
            return Err(StockroomError::new(
                "Fjall store requires a db_path",
                ErrorKind::InvalidOperation,
            ));
        }

        let keyspace = Keyspace::open(config.keyspace_config()).map_err(to_stockroom_error)?;
        log::info!(
            "Opened {} keyspace at {}",
            Self::store_version(),
            config.db_path()
        );

        Ok(FjallStore {
            inner: Arc::new(FjallStoreInner {
                config,
                keyspace,
                collections: DashMap::new(),
            }),
        })
    }

    pub fn config(&self) -> &FjallConfig {
        &self.inner.config
    }

    pub fn store_version() -> String {
        match fjall_version() {
            Ok(version) => format!("Fjall/{}", version),
            Err(_) => "Fjall".to_string(),
        }
    }
}

impl RecordStoreProvider for FjallStore {
    fn read_all(&self, collection: &str) -> StockroomResult<Vec<Document>> {
        match self.inner.collection(collection, false)? {
            Some(handle) => handle.records(),
            None => Ok(Vec::new()),
        }
    }

    fn write_all(&self, collection: &str, records: &[Document]) -> StockroomResult<()> {
        let handle = self.inner.require_collection(collection)?;
        let mut batch = self.inner.keyspace.batch();

        for entry in handle.records.iter() {
            let (key, _) = entry.map_err(to_stockroom_error)?;
            batch.remove(&handle.records, key);
        }
        // entries of one batch share a seqno, so a key must not be both
        // removed and inserted in it
        let rewritten: HashSet<RecordId> = records.iter().filter_map(Document::id).collect();
        for entry in handle.ids.iter() {
            let (key, _) = entry.map_err(to_stockroom_error)?;
            let kept = std::str::from_utf8(&key)
                .ok()
                .and_then(|id| RecordId::parse(id).ok())
                .is_some_and(|id| rewritten.contains(&id));
            if !kept {
                batch.remove(&handle.ids, key);
            }
        }
        for record in records {
            handle.stage_insert(&mut batch, record)?;
        }

        self.inner.commit(batch)
    }

    fn collection_names(&self) -> StockroomResult<BTreeSet<String>> {
        let names = self
            .inner
            .keyspace
            .list_partitions()
            .iter()
            .filter_map(|partition| {
                let name: &str = partition;
                if name.ends_with(ID_PARTITION_SUFFIX) {
                    None
                } else {
                    Some(name.to_string())
                }
            })
            .collect();
        Ok(names)
    }

    fn drop_collection(&self, collection: &str) -> StockroomResult<bool> {
        let handle = match self.inner.collection(collection, false)? {
            Some(handle) => handle,
            None => return Ok(false),
        };
        self.inner.collections.remove(collection);

        let keyspace = &self.inner.keyspace;
        keyspace
            .delete_partition(handle.ids.clone())
            .map_err(to_stockroom_error)?;
        keyspace
            .delete_partition(handle.records.clone())
            .map_err(to_stockroom_error)?;
        log::debug!("Dropped fjall partitions of {}", collection);
        Ok(true)
    }

    fn find_by_id(&self, collection: &str, id: &RecordId) -> StockroomResult<Option<Document>> {
        match self.inner.collection(collection, false)? {
            Some(handle) => handle.get(id),
            None => Ok(None),
        }
    }

    fn insert_item(&self, collection: &str, record: &Document) -> StockroomResult<()> {
        let handle = self.inner.require_collection(collection)?;
        let mut batch = self.inner.keyspace.batch();
        handle.stage_insert(&mut batch, record)?;
        self.inner.commit(batch)
    }

    fn replace_items(&self, collection: &str, records: &[Document]) -> StockroomResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let handle = match self.inner.collection(collection, false)? {
            Some(handle) => handle,
            None => return Ok(()),
        };

        let mut batch = self.inner.keyspace.batch();
        for record in records {
            let Some(id) = record.id() else { continue };
            if let Some(sequence) = handle.sequence_of(&id)? {
                batch.insert(
                    &handle.records,
                    &encode_sequence(sequence)[..],
                    encode_record(record)?,
                );
            }
        }
        self.inner.commit(batch)
    }

    fn remove_items(&self, collection: &str, ids: &[RecordId]) -> StockroomResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let handle = match self.inner.collection(collection, false)? {
            Some(handle) => handle,
            None => return Ok(0),
        };

        let mut batch = self.inner.keyspace.batch();
        let mut removed = 0;
        for id in ids {
            if let Some(sequence) = handle.sequence_of(id)? {
                batch.remove(&handle.records, &encode_sequence(sequence)[..]);
                batch.remove(&handle.ids, id.as_str().as_bytes());
                removed += 1;
            }
        }
        if removed > 0 {
            self.inner.commit(batch)?;
        }
        Ok(removed)
    }

    fn close(&self) -> StockroomResult<()> {
        self.inner.persist()
    }
}

struct FjallStoreInner {
    config: FjallConfig,
    keyspace: Keyspace,
    collections: DashMap<String, Arc<CollectionPartitions>>,
}

impl FjallStoreInner {
    /// Returns the partitions of `name`, opening them on first use. Missing
    /// collections are only created when `create` is set.
    fn collection(
        &self,
        name: &str,
        create: bool,
    ) -> StockroomResult<Option<Arc<CollectionPartitions>>> {
        if let Some(handle) = self.collections.get(name) {
            return Ok(Some(handle.value().clone()));
        }
        if !create && !self.keyspace.partition_exists(name) {
            return Ok(None);
        }

        let entry = self
            .collections
            .entry(name.to_string())
            .or_try_insert_with(|| CollectionPartitions::open(&self.keyspace, name).map(Arc::new))?;
        Ok(Some(entry.value().clone()))
    }

    fn require_collection(&self, name: &str) -> StockroomResult<Arc<CollectionPartitions>> {
        self.collection(name, true)?.ok_or_else(|| {
            StockroomError::new(
                &format!("Failed to open collection {}", name),
                ErrorKind::BackendError,
            )
        })
    }

    fn commit(&self, batch: Batch) -> StockroomResult<()> {
        batch.commit().map_err(to_stockroom_error)?;
        if self.config.fsync_on_write() {
            self.persist()?;
        }
        Ok(())
    }

    fn persist(&self) -> StockroomResult<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .map_err(to_stockroom_error)
    }
}

impl Drop for FjallStoreInner {
    fn drop(&mut self) {
        if let Err(err) = self.persist() {
            log::error!("Failed to persist fjall keyspace on drop: {}", err);
        }
    }
}

struct CollectionPartitions {
    records: PartitionHandle,
    ids: PartitionHandle,
    next_sequence: AtomicU64,
}

impl CollectionPartitions {
    fn open(keyspace: &Keyspace, name: &str) -> StockroomResult<CollectionPartitions> {
        let records = keyspace
            .open_partition(name, PartitionCreateOptions::default())
            .map_err(to_stockroom_error)?;
        let ids = keyspace
            .open_partition(
                &format!("{}{}", name, ID_PARTITION_SUFFIX),
                PartitionCreateOptions::default(),
            )
            .map_err(to_stockroom_error)?;

        let next_sequence = match records.last_key_value().map_err(to_stockroom_error)? {
            Some((key, _)) => decode_sequence(&key)? + 1,
            None => 0,
        };

        Ok(CollectionPartitions {
            records,
            ids,
            next_sequence: AtomicU64::new(next_sequence),
        })
    }

    fn records(&self) -> StockroomResult<Vec<Document>> {
        let mut records = Vec::new();
        for entry in self.records.iter() {
            let (_, value) = entry.map_err(to_stockroom_error)?;
            records.push(decode_record(&value)?);
        }
        Ok(records)
    }

    fn sequence_of(&self, id: &RecordId) -> StockroomResult<Option<u64>> {
        match self
            .ids
            .get(id.as_str().as_bytes())
            .map_err(to_stockroom_error)?
        {
            Some(bytes) => Ok(Some(decode_sequence(&bytes)?)),
            None => Ok(None),
        }
    }

    fn get(&self, id: &RecordId) -> StockroomResult<Option<Document>> {
        let Some(sequence) = self.sequence_of(id)? else {
            return Ok(None);
        };
        match self
            .records
            .get(&encode_sequence(sequence)[..])
            .map_err(to_stockroom_error)?
        {
            Some(bytes) => Ok(Some(decode_record(&bytes)?)),
            None => {
                log::warn!("Identifier {} points at a missing record", id);
                Ok(None)
            }
        }
    }

    fn stage_insert(&self, batch: &mut Batch, record: &Document) -> StockroomResult<()> {
        let id = record.id().ok_or_else(|| {
            StockroomError::new("Record has no identifier", ErrorKind::NotIdentifiable)
        })?;
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let key = encode_sequence(sequence);

        batch.insert(&self.records, &key[..], encode_record(record)?);
        batch.insert(&self.ids, id.as_str().as_bytes(), &key[..]);
        Ok(())
    }
}

fn encode_record(record: &Document) -> StockroomResult<Vec<u8>> {
    serde_json::to_vec(record)
        .map_err(|e| FjallRecordError::Encode(e.to_string()).into())
}

fn decode_record(bytes: &[u8]) -> StockroomResult<Document> {
    serde_json::from_slice(bytes).map_err(|e| FjallRecordError::Decode(e.to_string()).into())
}
