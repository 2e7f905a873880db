use crate::collection::Document;
use crate::errors::StockroomResult;
use itertools::Itertools;
use std::any::Any;
use std::fmt::Display;

use super::{Filter, FilterProvider};

/// Conjunction of filters. An empty conjunction matches every record.
pub struct AndFilter {
    filters: Vec<Filter>,
}

impl AndFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        AndFilter { filters }
    }
}

impl Display for AndFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.filters.iter().join(" && "))
    }
}

impl FilterProvider for AndFilter {
    fn apply(&self, entry: &Document) -> StockroomResult<bool> {
        for filter in &self.filters {
            if !filter.apply(entry)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn logical_filters(&self) -> StockroomResult<Vec<Filter>> {
        Ok(self.filters.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::filter::field;

    #[test]
    fn all_children_must_match() {
        let filter = AndFilter::new(vec![field("a").eq(1), field("b").gte(2)]);
        assert!(filter.apply(&doc! { a: 1, b: 3 }).unwrap());
        assert!(!filter.apply(&doc! { a: 1, b: 1 }).unwrap());
        assert!(!filter.apply(&doc! { b: 3 }).unwrap());
    }

    #[test]
    fn empty_conjunction_matches() {
        let filter = AndFilter::new(vec![]);
        assert!(filter.apply(&doc! { a: 1 }).unwrap());
    }

    #[test]
    fn exposes_children() {
        let filter = AndFilter::new(vec![field("a").eq(1), field("b").eq(2)]);
        assert_eq!(filter.logical_filters().unwrap().len(), 2);
    }
}
