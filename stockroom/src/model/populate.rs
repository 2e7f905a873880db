use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::collection::Document;
use crate::common::{is_valid_collection_name, Value, POPULATE_PATH_SEPARATOR};
use crate::errors::{ErrorKind, StockroomError, StockroomResult};
use crate::store::RecordStore;

/// A reference to resolve, written `<collection>.<field>`.
///
/// `products.productId` replaces the `productId` of each record with the
/// product whose `_id` it holds. The field part may itself be a dotted path
/// into embedded documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulatePath {
    collection: String,
    field: String,
}

impl PopulatePath {
    pub fn parse(path: &str) -> StockroomResult<PopulatePath> {
        match path.split_once(POPULATE_PATH_SEPARATOR) {
            Some((collection, field))
                if is_valid_collection_name(collection) && !field.is_empty() =>
            {
                Ok(PopulatePath {
                    collection: collection.to_string(),
                    field: field.to_string(),
                })
            }
            _ => {
                log::error!("Invalid populate path {:?}", path);
                Err(StockroomError::new(
                    &format!("Invalid populate path {:?}, expected <collection>.<field>", path),
                    ErrorKind::InvalidFieldName,
                ))
            }
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl Display for PopulatePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.collection, POPULATE_PATH_SEPARATOR, self.field)
    }
}

/// Replaces foreign identifiers with the records they reference, one level
/// deep. The target collection is read once per call. Fields that are
/// missing, not a string, or reference no record are left as they are.
pub(crate) fn populate_records(
    store: &RecordStore,
    records: Vec<Document>,
    path: &PopulatePath,
) -> StockroomResult<Vec<Document>> {
    let referenced: HashMap<String, Document> = store
        .read_all(path.collection())?
        .into_iter()
        .filter_map(|record| record.id().map(|id| (id.into_string(), record)))
        .collect();

    let mut populated = Vec::with_capacity(records.len());
    for mut record in records {
        let target = match record.get(path.field()) {
            Some(Value::String(id)) => referenced.get(id).cloned(),
            _ => None,
        };
        if let Some(target) = target {
            record.put(path.field(), target)?;
        }
        populated.push(record);
    }
    Ok(populated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::store::memory::InMemoryStore;

    #[test]
    fn parses_collection_and_field() {
        let path = PopulatePath::parse("products.productId").unwrap();
        assert_eq!(path.collection(), "products");
        assert_eq!(path.field(), "productId");
        assert_eq!(path.to_string(), "products.productId");

        let nested = PopulatePath::parse("suppliers.supplier.supplierId").unwrap();
        assert_eq!(nested.field(), "supplier.supplierId");
    }

    #[test]
    fn rejects_malformed_paths() {
        for path in ["products", "products.", ".productId", ""] {
            let err = PopulatePath::parse(path).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidFieldName);
        }
    }

    #[test]
    fn resolves_and_leaves_dangling_references() {
        let store = RecordStore::new(InMemoryStore::new());
        store
            .write_all("products", vec![doc! { _id: "p1", sku: "A" }])
            .unwrap();

        let records = vec![
            doc! { productId: "p1", currentStock: 5 },
            doc! { productId: "missing", currentStock: 1 },
            doc! { currentStock: 0 },
        ];
        let path = PopulatePath::parse("products.productId").unwrap();
        let out = populate_records(&store, records, &path).unwrap();

        assert_eq!(out[0].get("productId.sku"), Some(&Value::from("A")));
        assert_eq!(out[1].get("productId"), Some(&Value::from("missing")));
        assert_eq!(out[2].get("productId"), None);
    }

    #[test]
    fn resolves_embedded_field() {
        let store = RecordStore::new(InMemoryStore::new());
        store
            .write_all("suppliers", vec![doc! { _id: "s1", name: "Acme" }])
            .unwrap();

        let path = PopulatePath::parse("suppliers.supplier.supplierId").unwrap();
        let out =
            populate_records(&store, vec![doc! { supplier: { supplierId: "s1" } }], &path).unwrap();
        assert_eq!(out[0].get("supplier.supplierId.name"), Some(&Value::from("Acme")));
    }
}
