//! Exchange rates with an in-process cache.
//!
//! Rates come from a [RateSource]; the network provider is supplied by the
//! caller. A [RateCache] keeps fetched rates, and their inverses, for a fixed
//! time to live and evicts the least recently used pair once full.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use stockroom::errors::{ErrorKind, StockroomError, StockroomResult};

use super::validation_error;
use crate::timestamp;

pub const DEFAULT_RATE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_RATE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(capacity) => capacity,
    None => panic!("rate cache capacity must be non-zero"),
};

/// Supplies the rate converting one unit of `from` into `to`.
pub trait RateSource: Send + Sync {
    fn fetch_rate(&self, from: &str, to: &str) -> StockroomResult<f64>;
}

/// A source answering from a fixed table. Pairs missing from the table are
/// answered from their inverse when present.
#[derive(Debug, Clone, Default)]
pub struct FixedRates {
    rates: HashMap<(String, String), f64>,
}

impl FixedRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, from: &str, to: &str, rate: f64) -> Self {
        self.rates
            .insert((from.to_uppercase(), to.to_uppercase()), rate);
        self
    }
}

impl RateSource for FixedRates {
    fn fetch_rate(&self, from: &str, to: &str) -> StockroomResult<f64> {
        if let Some(rate) = self.rates.get(&(from.to_string(), to.to_string())) {
            return Ok(*rate);
        }
        match self.rates.get(&(to.to_string(), from.to_string())) {
            Some(inverse) if *inverse != 0.0 => Ok(1.0 / inverse),
            _ => Err(StockroomError::new(
                &format!("No exchange rate from {} to {}", from, to),
                ErrorKind::NotFound,
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub from: String,
    pub to: String,
    pub rate: f64,
    /// Whether the rate was answered without asking the source.
    pub cached: bool,
    #[serde(with = "timestamp")]
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
struct CachedRate {
    rate: f64,
    stored: Instant,
    fetched_at: DateTime<Utc>,
}

pub struct RateCache<S: RateSource> {
    source: S,
    ttl: Duration,
    entries: Arc<Mutex<LruCache<(String, String), CachedRate>>>,
}

impl<S: RateSource> RateCache<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, DEFAULT_RATE_TTL, DEFAULT_RATE_CAPACITY)
    }

    pub fn with_options(source: S, ttl: Duration, capacity: NonZeroUsize) -> Self {
        RateCache {
            source,
            ttl,
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn rate(&self, from: &str, to: &str) -> StockroomResult<ExchangeRate> {
        let from = currency_code(from)?;
        let to = currency_code(to)?;
        if from == to {
            return Ok(ExchangeRate {
                from,
                to,
                rate: 1.0,
                cached: true,
                fetched_at: timestamp::now(),
            });
        }

        let key = (from.clone(), to.clone());
        {
            let mut entries = self.entries.lock();
            match entries.get(&key).copied() {
                Some(entry) if entry.stored.elapsed() < self.ttl => {
                    return Ok(ExchangeRate {
                        from,
                        to,
                        rate: entry.rate,
                        cached: true,
                        fetched_at: entry.fetched_at,
                    });
                }
                Some(_) => {
                    entries.pop(&key);
                }
                None => {}
            }
        }

        let rate = self.source.fetch_rate(&from, &to)?;
        if !rate.is_finite() || rate <= 0.0 {
            log::error!("Rate source answered {} for {} to {}", rate, from, to);
            return Err(StockroomError::new(
                &format!("Invalid exchange rate {} from {} to {}", rate, from, to),
                ErrorKind::BackendError,
            ));
        }
        log::debug!("Fetched exchange rate {} to {}: {}", from, to, rate);

        let entry = CachedRate {
            rate,
            stored: Instant::now(),
            fetched_at: timestamp::now(),
        };
        let mut entries = self.entries.lock();
        entries.put(key, entry);
        entries.put(
            (to.clone(), from.clone()),
            CachedRate {
                rate: 1.0 / rate,
                ..entry
            },
        );

        Ok(ExchangeRate {
            from,
            to,
            rate,
            cached: false,
            fetched_at: entry.fetched_at,
        })
    }

    pub fn convert(&self, amount: f64, from: &str, to: &str) -> StockroomResult<f64> {
        Ok(amount * self.rate(from, to)?.rate)
    }

    /// Forgets a pair and its inverse.
    pub fn invalidate(&self, from: &str, to: &str) -> StockroomResult<()> {
        let from = currency_code(from)?;
        let to = currency_code(to)?;
        let mut entries = self.entries.lock();
        entries.pop(&(from.clone(), to.clone()));
        entries.pop(&(to, from));
        Ok(())
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<S: RateSource + Clone> Clone for RateCache<S> {
    fn clone(&self) -> Self {
        RateCache {
            source: self.source.clone(),
            ttl: self.ttl,
            entries: self.entries.clone(),
        }
    }
}

/// Three ASCII letters, upper-cased.
fn currency_code(code: &str) -> StockroomResult<String> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(validation_error(&format!("Invalid currency code {}", code)));
    }
    Ok(code.to_ascii_uppercase())
}
