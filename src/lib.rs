// Refnet: placement tree reconstruction and team census over a remote referral ledger.

// === Core types, errors and configuration ===
pub use refnet_core::{
    Address, ConfigError, LookupError, NodeId, NodeKey, NodeRecord, RelationshipType, Standing,
    TraversalConfig, TraversalError,
};

// === Query layer ===
pub use refnet_query::{HttpLedger, MemoryLedger, NodeCache, NodeQuery};

// === Traversal engines ===
pub use refnet_traversal::{CensusReport, TeamCensus, TreeReconstructor, TreeView};

// === Command line ===
pub mod cli;
