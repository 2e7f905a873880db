use crate::collection::RecordId;
use crate::common::{Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, StockroomError, StockroomResult};
use im::{OrdMap, Vector};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

type FieldVec = SmallVec<[String; 8]>;

/// A record: an ordered mapping of field name to [Value].
///
/// Nested fields are addressed with `.` separated paths (`pricing.costPrice`),
/// and array elements with numeric segments (`movements.0.quantity`).
///
/// ## Reserved Field
///
/// * `_id` - The record identifier. It always holds a string; the facade
///   assigns a fresh [RecordId] when a record is created.
///
/// Fields iterate and serialize in insertion order, which is what makes a
/// multi-key sort specification apply its keys in the order written.
/// Equality, hashing and ordering ignore field order.
///
/// The field map is an `im::OrdMap`, so cloning a record is O(1) and the
/// pipeline can fan records out into groups without deep copies.
#[derive(Clone, Default)]
pub struct Document {
    data: OrdMap<String, Value>,
    order: Vector<String>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
            order: Vector::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`, creating intermediate documents for
    /// embedded keys such as `"supplier.name"`.
    ///
    /// # Errors
    ///
    /// * the key (or one of its segments) is empty
    /// * the key is `_id` and the value is not a non-empty string
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("pricing.costPrice", 4.5)?;
    /// assert_eq!(doc.get("pricing.costPrice"), Some(&Value::F64(4.5)));
    /// ```
    pub fn put(&mut self, key: &str, value: impl Into<Value>) -> StockroomResult<()> {
        let value = value.into();
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(StockroomError::new(
                "Document does not support empty key",
                ErrorKind::InvalidFieldName,
            ));
        }

        if key == DOC_ID {
            return match value.as_str() {
                Some(id) if !id.is_empty() => {
                    self.insert_field(key.to_string(), value);
                    Ok(())
                }
                _ => {
                    log::error!("Record identifier must be a non-empty string, found {}", value);
                    Err(StockroomError::new(
                        "Record identifier must be a non-empty string",
                        ErrorKind::InvalidId,
                    ))
                }
            };
        }

        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_put(&splits, value)
        } else {
            self.insert_field(key.to_string(), value);
            Ok(())
        }
    }

    /// Inserts a top-level field as is. Used when decoding stored records.
    pub(crate) fn insert_raw(&mut self, key: String, value: Value) {
        self.insert_field(key, value);
    }

    fn insert_field(&mut self, key: String, value: Value) {
        if self.data.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
    }

    fn remove_field(&mut self, key: &str) -> Option<Value> {
        let removed = self.data.remove(key)?;
        if let Some(index) = self.order.iter().position(|k| k == key) {
            self.order.remove(index);
        }
        Some(removed)
    }

    /// Returns the value at `key`, following embedded paths.
    ///
    /// A missing field, a path through a non-document value or an array
    /// index out of range all yield `None`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.data.get(key) {
            return Some(value);
        }
        if !key.contains(FIELD_SEPARATOR) {
            return None;
        }

        let mut splits = key.split(FIELD_SEPARATOR);
        let first = splits.next()?;
        let mut current = self.data.get(first)?;
        for segment in splits {
            current = match current {
                Value::Document(doc) => doc.data.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Returns the record identifier, if the record carries a valid one.
    pub fn id(&self) -> Option<RecordId> {
        self.data
            .get(DOC_ID)
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .map(RecordId::from)
    }

    pub fn set_id(&mut self, id: &RecordId) {
        self.insert_field(DOC_ID.to_string(), Value::from(id));
    }

    pub fn has_id(&self) -> bool {
        self.id().is_some()
    }

    /// Removes the value at `key`, following embedded paths.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if let Some(value) = self.remove_field(key) {
            return Some(value);
        }

        let (parent, leaf) = key.rsplit_once(FIELD_SEPARATOR)?;
        let (head, rest) = match parent.split_once(FIELD_SEPARATOR) {
            Some((head, rest)) => (head, Some(rest)),
            None => (parent, None),
        };

        let mut nested = self.data.get(head)?.as_document()?.clone();
        let removed = match rest {
            Some(rest) => nested.remove(&format!("{}{}{}", rest, FIELD_SEPARATOR, leaf)),
            None => nested.remove_field(leaf),
        };
        if removed.is_some() {
            self.insert_field(head.to_string(), Value::Document(nested));
        }
        removed
    }

    /// Top-level field names in insertion order.
    pub fn keys(&self) -> FieldVec {
        self.order.iter().cloned().collect()
    }

    /// Top-level fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.order
            .iter()
            .filter_map(move |key| self.data.get(key).map(|value| (key, value)))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Checks whether a top-level or embedded field exists.
    pub fn contains_field(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Overwrites top-level fields with those of `patch`.
    ///
    /// This is an update patch: nested documents in `patch` replace the
    /// stored ones wholesale and the identifier of `self` never changes.
    pub fn patch(&mut self, patch: &Document) {
        for (key, value) in patch.iter() {
            if key == DOC_ID {
                continue;
            }
            self.insert_field(key.clone(), value.clone());
        }
    }

    /// Recursively merges `other` into this document.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.iter() {
            match (self.data.get(key).cloned(), value) {
                (Some(Value::Document(mut nested)), Value::Document(incoming)) => {
                    nested.merge(incoming);
                    self.insert_field(key.clone(), Value::Document(nested));
                }
                _ => {
                    self.insert_field(key.clone(), value.clone());
                }
            }
        }
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> StockroomResult<()> {
        let key = splits[0];
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(StockroomError::new(
                "Document does not support empty key",
                ErrorKind::InvalidFieldName,
            ));
        }

        if splits.len() == 1 {
            self.insert_field(key.to_string(), value);
            return Ok(());
        }

        let mut nested = match self.data.get(key) {
            Some(Value::Document(doc)) => doc.clone(),
            _ => Document::new(),
        };
        nested.deep_put(&splits[1..], value)?;
        self.insert_field(key.to_string(), Value::Document(nested));
        Ok(())
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Document {}

impl PartialOrd for Document {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Document {
    fn cmp(&self, other: &Self) -> Ordering {
        self.data.cmp(&other.data)
    }
}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Document(self.clone()))
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Document, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Document(doc) => Ok(doc),
            other => Err(serde::de::Error::custom(format!(
                "expected a record object, found {}",
                other
            ))),
        }
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (key, value) in iter {
            doc.insert_field(key, value);
        }
        doc
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// # Examples
///
/// ```rust
/// use stockroom::doc;
///
/// let empty = doc!{};
///
/// let product = doc!{
///     sku: "A-100",
///     pricing: { costPrice: 4.5, sellingPrice: 9.0 },
///     tags: ["hardware", "small"],
/// };
///
/// // operator keys are written as string literals
/// let filter = doc!{ currentStock: { "$lt": 10 } };
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::collection::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put_literal(
                    &$crate::collection::normalize(stringify!($key)),
                    $crate::doc_value!($value),
                );
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

impl Document {
    /// Inserts a top-level field without validation. Backs the `doc!` macro.
    #[doc(hidden)]
    pub fn put_literal(&mut self, key: &str, value: Value) {
        self.insert_field(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_up() -> Document {
        doc! {
            sku: "A-100",
            pricing: {
                costPrice: 4.5,
                sellingPrice: 9,
            },
            movements: [
                { quantity: 5 },
                { quantity: (-2) },
            ],
        }
    }

    #[test]
    fn get_top_level_and_embedded() {
        let doc = set_up();
        assert_eq!(doc.get("sku"), Some(&Value::from("A-100")));
        assert_eq!(doc.get("pricing.costPrice"), Some(&Value::F64(4.5)));
        assert_eq!(doc.get("movements.1.quantity"), Some(&Value::I64(-2)));
    }

    #[test]
    fn get_missing_is_none() {
        let doc = set_up();
        assert_eq!(doc.get("barcode"), None);
        assert_eq!(doc.get("pricing.currency"), None);
        assert_eq!(doc.get("sku.length"), None);
        assert_eq!(doc.get("movements.7.quantity"), None);
    }

    #[test]
    fn put_embedded_creates_parents() {
        let mut doc = Document::new();
        doc.put("supplier.name", "Acme").unwrap();
        doc.put("supplier.leadTimeDays", 7).unwrap();
        assert_eq!(doc.get("supplier.name"), Some(&Value::from("Acme")));
        assert_eq!(doc.get("supplier").and_then(|v| v.as_document()).map(|d| d.size()), Some(2));
    }

    #[test]
    fn put_rejects_empty_key() {
        let mut doc = Document::new();
        let err = doc.put("", 1).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidFieldName);
        assert!(doc.put("a..b", 1).is_err());
    }

    #[test]
    fn put_id_requires_string() {
        let mut doc = Document::new();
        assert_eq!(doc.put(DOC_ID, 5).unwrap_err().kind(), &ErrorKind::InvalidId);
        assert!(doc.put(DOC_ID, "").is_err());
        doc.put(DOC_ID, "42").unwrap();
        assert_eq!(doc.id(), Some(RecordId::from("42")));
    }

    #[test]
    fn remove_embedded_field() {
        let mut doc = set_up();
        assert_eq!(doc.remove("pricing.costPrice"), Some(Value::F64(4.5)));
        assert!(!doc.contains_field("pricing.costPrice"));
        assert!(doc.contains_field("pricing.sellingPrice"));
        assert_eq!(doc.remove("pricing.currency"), None);
    }

    #[test]
    fn patch_overwrites_top_level_and_keeps_id() {
        let mut doc = set_up();
        doc.set_id(&RecordId::from("1"));
        doc.patch(&doc! { _id: "2", pricing: { costPrice: 5 }, isActive: false });
        assert_eq!(doc.id(), Some(RecordId::from("1")));
        assert_eq!(doc.get("pricing.sellingPrice"), None);
        assert_eq!(doc.get("pricing.costPrice"), Some(&Value::I64(5)));
        assert_eq!(doc.get("isActive"), Some(&Value::Bool(false)));
    }

    #[test]
    fn merge_is_recursive() {
        let mut doc = set_up();
        doc.merge(&doc! { pricing: { currency: "USD" } });
        assert_eq!(doc.get("pricing.costPrice"), Some(&Value::F64(4.5)));
        assert_eq!(doc.get("pricing.currency"), Some(&Value::from("USD")));
    }

    #[test]
    fn serde_uses_plain_objects() {
        let doc = doc! { _id: "7", qty: 3 };
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, r#"{"_id":"7","qty":3}"#);
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn deserialize_rejects_non_objects() {
        assert!(serde_json::from_str::<Document>("[1,2]").is_err());
    }

    #[test]
    fn macro_accepts_quoted_operator_keys() {
        let filter = doc! { currentStock: { "$lt": 10 } };
        assert_eq!(filter.get("currentStock.$lt"), Some(&Value::I64(10)));
    }

    #[test]
    fn fields_keep_insertion_order() {
        let mut doc = doc! { zeta: 1, alpha: 2 };
        doc.put("mid", 3).unwrap();
        let keys: Vec<String> = doc.keys().into_iter().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

        doc.remove("alpha");
        doc.put("alpha", 4).unwrap();
        let keys: Vec<&String> = doc.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "mid", "alpha"]);
    }

    #[test]
    fn equality_ignores_field_order() {
        assert_eq!(doc! { a: 1, b: 2 }, doc! { b: 2, a: 1 });
    }

    #[test]
    fn normalize_strips_quotes() {
        assert_eq!(normalize("\"$gte\""), "$gte");
        assert_eq!(normalize("sku"), "sku");
    }
}
