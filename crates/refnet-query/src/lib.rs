// Remote node query layer.
//
// Everything a traversal needs from the ledger goes through `NodeQuery`. Backends convert
// their payloads into typed records before returning, and report failures as
// `LookupError` so that "genuinely absent" and "fetch failed" stay distinguishable.

use async_trait::async_trait;

use refnet_core::{Address, LookupError, NodeId, NodeRecord, Standing};

pub mod batch;
pub mod cache;
pub mod http;
pub mod memory;
pub mod reader;

pub use batch::BatchedFetcher;
pub use cache::{CacheLifetime, CacheStats, NodeCache};
pub use http::HttpLedger;
pub use memory::{LedgerSnapshot, MemoryLedger, SnapshotError};
pub use reader::{Activity, LedgerReader};

/// Read-only point lookups against the remote ledger.
///
/// Every method may fail transiently. Implementations return `LookupError::Unavailable`
/// only when the interface as a whole cannot be reached.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NodeQuery: Send + Sync {
    async fn get_node_by_id(&self, id: NodeId) -> Result<Option<NodeRecord>, LookupError>;

    async fn get_node_by_address(
        &self,
        address: &Address,
    ) -> Result<Option<NodeRecord>, LookupError>;

    /// First-line referrals of `address` in the sponsor graph. Unbounded length.
    async fn get_direct_referrals(&self, address: &Address) -> Result<Vec<Address>, LookupError>;

    async fn is_active(&self, address: &Address) -> Result<bool, LookupError>;

    /// Display attributes (`maxLevel`, `rank`). Backends without them report `None`.
    async fn get_standing(&self, _id: NodeId) -> Result<Option<Standing>, LookupError> {
        Ok(None)
    }
}
