use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON document: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid reservation request: {0}")]
    InvalidRequest(String),

    #[error("No space available in this slice for {count} contiguous nodes")]
    NoSpaceInSlice { count: usize },

    #[error("No capacity for {node_count} node(s) over {minutes} minute(s) within a horizon of {max_slices} slices")]
    NoCapacity { node_count: usize, minutes: i64, max_slices: usize },

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Failure looking up {host}: {reason}")]
    ExternalLookupFailure { host: String, reason: String },

    #[error("A reservation named {0} already exists")]
    DuplicateReservation(String),

    #[error("No reservation named {0}")]
    UnknownReservation(String),

    #[error("Failed to persist scheduler state: {0}")]
    PersistenceError(String),
}

/// Raised while converting configuration DTOs into validated domain objects.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Field {field} is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Range {field} is empty: {min} > {max}")]
    EmptyRange { field: &'static str, min: i64, max: i64 },
}

impl From<ConversionError> for Error {
    fn from(err: ConversionError) -> Self {
        Error::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
