use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::collection::{Document, RecordId};
use crate::common::{Value, DOC_ID};
use crate::errors::{ErrorKind, StockroomError, StockroomResult};

/// A typed record stored in a fixed collection.
///
/// The identifier field must serialize under `_id`, usually as
/// `#[serde(rename = "_id", skip_serializing_if = "Option::is_none")]` on an
/// `Option<RecordId>` field. Usually derived:
///
/// ```rust,ignore
/// use serde::{Deserialize, Serialize};
/// use stockroom::collection::RecordId;
/// use stockroom_derive::Entity;
///
/// #[derive(Entity, Serialize, Deserialize)]
/// #[entity(collection = "suppliers", id = "id")]
/// struct Supplier {
///     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
///     id: Option<RecordId>,
///     name: String,
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name of the collection holding this entity.
    const COLLECTION: &'static str;

    fn entity_id(&self) -> Option<RecordId>;

    fn set_entity_id(&mut self, id: RecordId);
}

/// Maps an entity to a record. A null identifier is dropped so the store can
/// assign one.
pub fn to_document<T: Serialize>(entity: &T) -> StockroomResult<Document> {
    let json = serde_json::to_value(entity).map_err(|err| mapping_error("serialize", err))?;
    match Value::from(json) {
        Value::Document(mut document) => {
            if document.get(DOC_ID).is_some_and(Value::is_null) {
                document.remove(DOC_ID);
            }
            Ok(document)
        }
        other => {
            log::error!("Entity serialized to a non-document value {}", other);
            Err(StockroomError::new(
                &format!("Entity serialized to a non-document value {}", other),
                ErrorKind::ObjectMappingError,
            ))
        }
    }
}

/// Maps a record back to an entity.
pub fn from_document<T: DeserializeOwned>(document: Document) -> StockroomResult<T> {
    let json = serde_json::Value::from(&Value::Document(document));
    serde_json::from_value(json).map_err(|err| mapping_error("deserialize", err))
}

fn mapping_error(action: &str, err: serde_json::Error) -> StockroomError {
    log::error!("Failed to {} entity: {}", action, err);
    StockroomError::new_with_cause(
        &format!("Failed to {} entity", action),
        ErrorKind::ObjectMappingError,
        err.into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Supplier {
        #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
        id: Option<RecordId>,
        name: String,
        #[serde(rename = "leadTimeDays")]
        lead_time_days: u32,
    }

    #[test]
    fn maps_to_and_from_documents() {
        let supplier = Supplier {
            id: Some(RecordId::from("s1")),
            name: "Acme".into(),
            lead_time_days: 7,
        };
        let document = to_document(&supplier).unwrap();
        assert_eq!(document, doc! { _id: "s1", name: "Acme", leadTimeDays: 7 });
        assert_eq!(from_document::<Supplier>(document).unwrap(), supplier);
    }

    #[test]
    fn missing_id_is_omitted() {
        let supplier = Supplier {
            id: None,
            name: "Acme".into(),
            lead_time_days: 7,
        };
        assert!(!to_document(&supplier).unwrap().has_id());
    }

    #[test]
    fn null_id_is_dropped() {
        #[derive(Serialize)]
        struct Loose {
            #[serde(rename = "_id")]
            id: Option<String>,
        }
        assert!(!to_document(&Loose { id: None }).unwrap().has_id());
    }

    #[test]
    fn shape_mismatch_is_mapping_error() {
        let err = from_document::<Supplier>(doc! { name: 5 }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
        let err = to_document(&5).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
    }
}
