use crate::errors::{StockroomError, StockroomResult};
use crate::filter::QueryPolicy;
use crate::stockroom::Stockroom;
use crate::stockroom_config::StockroomConfig;
use crate::store::StoreModule;

/// Builds and opens a [Stockroom].
///
/// The first failing step is remembered and reported by [open](Self::open).
///
/// ```rust,ignore
/// let db = Stockroom::builder()
///     .load_module(JsonStoreModule::with_config().data_dir("data").build())
///     .query_policy(QueryPolicy::Strict)
///     .open()?;
/// ```
#[derive(Default)]
pub struct StockroomBuilder {
    error: Option<StockroomError>,
    config: StockroomConfig,
}

impl StockroomBuilder {
    pub fn new() -> Self {
        StockroomBuilder {
            error: None,
            config: StockroomConfig::new(),
        }
    }

    pub fn query_policy(mut self, policy: QueryPolicy) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_query_policy(policy) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn load_module<T: StoreModule>(mut self, module: T) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.load_module(module) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn open(self) -> StockroomResult<Stockroom> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.config.auto_configure()?;
        Stockroom::new(self.config)
    }
}
