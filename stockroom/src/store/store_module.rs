use crate::errors::StockroomResult;
use crate::store::RecordStore;

/// Supplies the record store a database opens on.
pub trait StoreModule {
    fn get_store(&self) -> StockroomResult<RecordStore>;
}
