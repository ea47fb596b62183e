// === Identity primitives ===
pub mod types;
pub mod record;

// === Classification ===
pub mod relationship;

// === Errors and configuration ===
pub mod error;
pub mod config;

// === Re-exports for broader workspace access ===
pub use types::{Address, NodeId, NodeKey};
pub use record::{NodeRecord, RawNodeRecord, RawNumber, Standing};
pub use relationship::RelationshipType;
pub use error::{ConfigError, LookupError, RecordError, TraversalError};
pub use config::{TraversalConfig, DEFAULT_TECHNICAL_SPONSOR, MAX_DEPTH};
