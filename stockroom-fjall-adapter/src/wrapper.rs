use std::error::Error;
use stockroom::errors::{ErrorKind, StockroomError};
use thiserror::Error;

/// Failures decoding what the keyspace hands back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FjallRecordError {
    #[error("Record key has {0} bytes, expected 8")]
    MalformedKey(usize),
    #[error("Failed to decode record: {0}")]
    Decode(String),
    #[error("Failed to encode record: {0}")]
    Encode(String),
}

impl From<FjallRecordError> for StockroomError {
    fn from(err: FjallRecordError) -> Self {
        let kind = match err {
            FjallRecordError::Encode(_) => ErrorKind::EncodingError,
            _ => ErrorKind::FileCorrupted,
        };
        StockroomError::new(&err.to_string(), kind)
    }
}

/// Maps an engine error to a stockroom error, classifying it by message.
pub(crate) fn to_stockroom_error(err: impl Error) -> StockroomError {
    let message = err.to_string();
    let lower = message.to_lowercase();
    let kind = if lower.contains("poisoned") || lower.contains("closed") {
        ErrorKind::StoreNotInitialized
    } else if lower.contains("corrupt") || lower.contains("checksum") {
        ErrorKind::FileCorrupted
    } else if lower.contains("permission") {
        ErrorKind::PermissionDenied
    } else if lower.contains("i/o") || lower.contains("io error") {
        ErrorKind::IOError
    } else {
        ErrorKind::BackendError
    };
    log::error!("Fjall error: {}", message);
    StockroomError::new(&format!("Fjall Error: {}", message), kind)
}

/// Encodes an insertion sequence so that byte order matches numeric order.
#[inline]
pub(crate) fn encode_sequence(sequence: u64) -> [u8; 8] {
    sequence.to_be_bytes()
}

pub(crate) fn decode_sequence(bytes: &[u8]) -> Result<u64, FjallRecordError> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| FjallRecordError::MalformedKey(bytes.len()))?;
    Ok(u64::from_be_bytes(array))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Raw(&'static str);

    impl std::fmt::Display for Raw {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl Error for Raw {}

    #[test]
    fn classifies_engine_errors() {
        assert_eq!(
            to_stockroom_error(Raw("Keyspace is poisoned")).kind(),
            &ErrorKind::StoreNotInitialized
        );
        assert_eq!(
            to_stockroom_error(Raw("block checksum mismatch")).kind(),
            &ErrorKind::FileCorrupted
        );
        assert_eq!(
            to_stockroom_error(Raw("Permission denied")).kind(),
            &ErrorKind::PermissionDenied
        );
        let other = to_stockroom_error(Raw("something odd"));
        assert_eq!(other.kind(), &ErrorKind::BackendError);
        assert_eq!(other.message(), "Fjall Error: something odd");
    }

    #[test]
    fn sequence_keys_sort_numerically() {
        assert!(encode_sequence(2) < encode_sequence(10));
        assert!(encode_sequence(255) < encode_sequence(256));
        assert_eq!(decode_sequence(&encode_sequence(42)), Ok(42));
    }

    #[test]
    fn short_key_is_malformed() {
        assert_eq!(decode_sequence(&[1, 2, 3]), Err(FjallRecordError::MalformedKey(3)));
        let err: StockroomError = FjallRecordError::MalformedKey(3).into();
        assert_eq!(err.kind(), &ErrorKind::FileCorrupted);
    }
}
