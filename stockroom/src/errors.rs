use backtrace::Backtrace;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for Stockroom operations.
///
/// Each kind describes one category of failure so callers can branch on it
/// without parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use stockroom::errors::{StockroomError, ErrorKind, StockroomResult};
///
/// fn example() -> StockroomResult<()> {
///     Err(StockroomError::new("Unsupported stage", ErrorKind::PipelineError))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Query errors
    /// Error during filter construction or evaluation
    FilterError,
    /// Error while parsing or running an aggregation pipeline
    PipelineError,

    // ID and identity errors
    /// The provided ID is invalid
    InvalidId,
    /// The record or entity carries no identifier
    NotIdentifiable,
    /// A referenced parent resource was not found
    NotFound,

    // Operation errors
    /// The operation is not valid in the current context
    InvalidOperation,

    // IO and storage errors
    /// Generic IO error
    IOError,
    /// The file was not found
    FileNotFound,
    /// Permission denied for file operation
    PermissionDenied,
    /// File data is corrupted
    FileCorrupted,

    // Data encoding errors
    /// Error encoding or decoding data
    EncodingError,
    /// Error mapping a typed entity to or from a document
    ObjectMappingError,

    // Security errors
    /// Password hashing or verification failed
    SecurityError,

    // Constraint and validation errors
    /// A unique constraint was violated
    UniqueConstraintViolation,
    /// Generic validation error
    ValidationError,
    /// Invalid field or collection name
    InvalidFieldName,
    /// Not enough stock for the requested movement
    InsufficientStock,

    // Backend and store errors
    /// Error from a storage backend
    BackendError,
    /// Store has not been initialized
    StoreNotInitialized,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::PipelineError => write!(f, "Pipeline error"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::NotIdentifiable => write!(f, "Not identifiable"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::FileNotFound => write!(f, "File not found"),
            ErrorKind::PermissionDenied => write!(f, "Permission denied"),
            ErrorKind::FileCorrupted => write!(f, "File corrupted"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::SecurityError => write!(f, "Security error"),
            ErrorKind::UniqueConstraintViolation => write!(f, "Unique constraint violation"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::InvalidFieldName => write!(f, "Invalid field name"),
            ErrorKind::InsufficientStock => write!(f, "Insufficient stock"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::StoreNotInitialized => write!(f, "Store not initialized"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom Stockroom error type.
///
/// Carries a message, a kind, an optional cause and the backtrace captured
/// when the error was created.
///
/// # Examples
///
/// ```rust,ignore
/// use stockroom::errors::{StockroomError, ErrorKind};
///
/// let cause = StockroomError::new("disk unplugged", ErrorKind::IOError);
/// let err = StockroomError::new_with_cause("Failed to write products", ErrorKind::IOError, cause);
/// ```
#[derive(Clone)]
pub struct StockroomError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<StockroomError>>,
    backtrace: Atomic<Backtrace>,
}

impl StockroomError {
    /// Creates a new `StockroomError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        StockroomError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `StockroomError` chained to the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: StockroomError) -> Self {
        StockroomError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&StockroomError> {
        self.cause.as_deref()
    }
}

impl Display for StockroomError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for StockroomError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for StockroomError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for Stockroom operations.
pub type StockroomResult<T> = Result<T, StockroomError>;

impl de::Error for StockroomError {
    fn custom<T: Display>(msg: T) -> Self {
        StockroomError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl ser::Error for StockroomError {
    fn custom<T: Display>(msg: T) -> Self {
        StockroomError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl From<std::io::Error> for StockroomError {
    fn from(err: std::io::Error) -> Self {
        let error_kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IOError,
        };
        StockroomError::new(&format!("IO error: {}", err), error_kind)
    }
}

impl From<serde_json::Error> for StockroomError {
    fn from(err: serde_json::Error) -> Self {
        let error_kind = if err.is_io() {
            ErrorKind::IOError
        } else {
            ErrorKind::EncodingError
        };
        StockroomError::new(&format!("JSON error: {}", err), error_kind)
    }
}

impl From<std::num::ParseIntError> for StockroomError {
    fn from(err: std::num::ParseIntError) -> Self {
        StockroomError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::InvalidId,
        )
    }
}

impl From<String> for StockroomError {
    fn from(msg: String) -> Self {
        StockroomError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for StockroomError {
    fn from(msg: &str) -> Self {
        StockroomError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_error_has_no_cause() {
        let error = StockroomError::new("An error occurred", ErrorKind::IOError);
        assert_eq!(error.message(), "An error occurred");
        assert_eq!(error.kind(), &ErrorKind::IOError);
        assert!(error.cause().is_none());
    }

    #[test]
    fn new_with_cause_chains_source() {
        let cause = StockroomError::new("disk unplugged", ErrorKind::IOError);
        let error = StockroomError::new_with_cause("write failed", ErrorKind::IOError, cause);
        assert_eq!(error.cause().map(|c| c.message()), Some("disk unplugged"));
        assert!(error.source().is_some());
    }

    #[test]
    fn debug_prints_cause_chain() {
        let cause = StockroomError::new("inner", ErrorKind::IOError);
        let error = StockroomError::new_with_cause("outer", ErrorKind::BackendError, cause);
        let text = format!("{:?}", error);
        assert!(text.starts_with("outer\nCaused by: inner"));
    }

    #[test]
    fn io_not_found_maps_to_file_not_found() {
        let err: StockroomError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert_eq!(err.kind(), &ErrorKind::FileNotFound);
        assert!(err.message().starts_with("IO error:"));
    }

    #[test]
    fn io_permission_denied_maps_to_permission_denied() {
        let err: StockroomError =
            std::io::Error::from(std::io::ErrorKind::PermissionDenied).into();
        assert_eq!(err.kind(), &ErrorKind::PermissionDenied);
    }

    #[test]
    fn other_io_errors_map_to_io_error() {
        let err: StockroomError = std::io::Error::other("boom").into();
        assert_eq!(err.kind(), &ErrorKind::IOError);
    }

    #[test]
    fn json_syntax_error_maps_to_encoding_error() {
        let parse = serde_json::from_str::<serde_json::Value>("{ not json");
        let err: StockroomError = parse.unwrap_err().into();
        assert_eq!(err.kind(), &ErrorKind::EncodingError);
    }

    #[test]
    fn serde_custom_maps_to_object_mapping_error() {
        let err = <StockroomError as de::Error>::custom("missing field");
        assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
    }

    #[test]
    fn kind_display() {
        assert_eq!(ErrorKind::InsufficientStock.to_string(), "Insufficient stock");
        assert_eq!(ErrorKind::PipelineError.to_string(), "Pipeline error");
    }
}
