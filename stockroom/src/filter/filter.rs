use crate::collection::{Document, RecordId};
use crate::common::DOC_ID;
use crate::errors::{ErrorKind, StockroomError, StockroomResult};
use std::any::Any;
use std::fmt::Display;
use std::ops::Deref;
use std::sync::Arc;

use super::{AllFilter, AndFilter, EqualsFilter};

/// Trait for implementing filters.
///
/// A `FilterProvider` decides whether a single record matches. Custom filters
/// can be plugged into [Filter::new] and combined with the built-in ones.
pub trait FilterProvider: Any + Send + Sync + Display {
    /// Applies the filter to a record and returns whether it matches.
    fn apply(&self, entry: &Document) -> StockroomResult<bool>;

    /// Checks if this filter operates on a specific field.
    #[inline]
    fn has_field(&self) -> bool {
        false
    }

    /// Gets the field name this filter operates on.
    fn get_field_name(&self) -> StockroomResult<String> {
        log::error!("Filter {} does not have field name", self);
        Err(StockroomError::new(
            "Filter does not have field name",
            ErrorKind::FilterError,
        ))
    }

    /// Child filters of a logical filter.
    fn logical_filters(&self) -> StockroomResult<Vec<Filter>> {
        Err(StockroomError::new(
            "Filter is not a logical filter",
            ErrorKind::FilterError,
        ))
    }

    fn as_any(&self) -> &dyn Any;
}

/// A query filter for selecting records from a collection.
///
/// `Filter` is a cheap, cloneable handle around a [FilterProvider].
#[derive(Clone)]
pub struct Filter {
    inner: Arc<dyn FilterProvider>,
}

impl Filter {
    pub fn new<T: FilterProvider + 'static>(inner: T) -> Self {
        Filter {
            inner: Arc::new(inner),
        }
    }

    /// Combines this filter with another using logical AND.
    pub fn and(&self, filter: Filter) -> Self {
        Filter::new(AndFilter::new(vec![self.clone(), filter]))
    }

    /// Returns the matching records, preserving their order.
    pub fn select(&self, records: Vec<Document>) -> StockroomResult<Vec<Document>> {
        let mut matched = Vec::with_capacity(records.len());
        for record in records {
            if self.apply(&record)? {
                matched.push(record);
            }
        }
        Ok(matched)
    }
}

impl Display for Filter {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Filter({})", self.inner)
    }
}

impl Deref for Filter {
    type Target = Arc<dyn FilterProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Creates a filter that matches every record.
pub fn all() -> Filter {
    Filter::new(AllFilter {})
}

/// Creates a filter that matches the record with the given identifier.
pub fn by_id(id: &RecordId) -> Filter {
    Filter::new(EqualsFilter::new(DOC_ID.to_string(), id.into()))
}

/// Creates a filter that matches when every given filter matches.
pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::new(AndFilter::new(filters))
}
