/// Refnet traversal engines.
///
/// - `TreeReconstructor` rebuilds the binary placement tree below an identity.
/// - `TeamCensus` counts the deduplicated team of an identity across the sponsor graph.
///
/// Both take the query interface and configuration at construction and an explicit
/// `NodeCache` per call, so the cache lifetime is always chosen by the caller.

pub mod census;
pub mod tree;
pub mod view;

pub use census::TeamCensus;
pub use tree::TreeReconstructor;
pub use view::{CensusReport, PlacedNode, TreeSummary, TreeView};
