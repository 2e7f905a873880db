use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Settings of a [FjallStore](crate::FjallStore).
///
/// Cloning is cheap; clones share the same settings.
#[derive(Clone)]
pub struct FjallConfig {
    inner: Arc<FjallConfigInner>,
}

impl FjallConfig {
    pub const DEFAULT_CACHE_MB: u64 = 32;

    #[inline]
    pub fn new() -> FjallConfig {
        FjallConfig {
            inner: Arc::new(FjallConfigInner {
                db_path: OnceLock::new(),
                cache_size: AtomicU64::new(Self::DEFAULT_CACHE_MB * 1_024 * 1_024),
                fsync_on_write: AtomicBool::new(false),
            }),
        }
    }

    #[inline]
    pub(crate) fn keyspace_config(&self) -> fjall::Config {
        fjall::Config::new(self.db_path()).cache_size(self.cache_size())
    }

    #[inline]
    pub fn db_path(&self) -> &str {
        self.inner.db_path.get().map(String::as_str).unwrap_or("")
    }

    /// The path can be set once; later calls are ignored.
    #[inline]
    pub(crate) fn set_db_path(&self, db_path: &str) {
        self.inner.db_path.get_or_init(|| db_path.to_string());
    }

    /// Block cache capacity in bytes.
    #[inline]
    pub fn cache_size(&self) -> u64 {
        self.inner.cache_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_cache_size(&self, bytes: u64) {
        self.inner.cache_size.store(bytes, Ordering::Relaxed)
    }

    /// Whether every write is synced to disk before returning.
    #[inline]
    pub fn fsync_on_write(&self) -> bool {
        self.inner.fsync_on_write.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_fsync_on_write(&self, v: bool) {
        self.inner.fsync_on_write.store(v, Ordering::Relaxed)
    }
}

impl Default for FjallConfig {
    fn default() -> Self {
        Self::new()
    }
}

struct FjallConfigInner {
    db_path: OnceLock<String>,
    cache_size: AtomicU64,
    fsync_on_write: AtomicBool,
}
