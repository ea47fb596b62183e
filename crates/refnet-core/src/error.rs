use thiserror::Error;

/// A raw query payload could not be converted into a typed record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),
    #[error("Invalid number in field `{field}`: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("Timestamp out of range: {0}")]
    InvalidTimestamp(u64),
}

/// Failure of a single remote lookup.
///
/// `Transient` failures degrade locally (the key is treated as absent or inactive).
/// `Unavailable` means the query interface itself cannot be reached and is the only
/// failure that surfaces from a traversal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("Transient lookup failure: {0}")]
    Transient(String),
    #[error("Query interface unavailable: {0}")]
    Unavailable(String),
}

impl LookupError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, LookupError::Unavailable(_))
    }
}

impl From<RecordError> for LookupError {
    fn from(err: RecordError) -> Self {
        LookupError::Transient(format!("malformed record: {}", err))
    }
}

/// Engine-level failure of a tree reconstruction or team census.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TraversalError {
    #[error("Query interface unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
