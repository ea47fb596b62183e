// Result structures handed to the presentation layer. In-memory only; the serde
// derives exist so callers can render them however they like.

use serde::{Deserialize, Serialize};

use refnet_core::{NodeId, NodeRecord, RelationshipType};

/// A node with its place in the binary tree.
///
/// `position` is the index within its depth level: the root is `(0, 0)`, the left child
/// of `(d, p)` is `(d + 1, 2p)` and the right child is `(d + 1, 2p + 1)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedNode {
    #[serde(flatten)]
    pub record: NodeRecord,
    pub depth: u32,
    pub position: u64,
    pub relationship_type: RelationshipType,
}

impl PlacedNode {
    pub fn new(
        record: NodeRecord,
        depth: u32,
        position: u64,
        root: NodeId,
        technical_sponsor: NodeId,
    ) -> Self {
        let relationship_type = RelationshipType::classify(&record, root, technical_sponsor);
        Self {
            record,
            depth,
            position,
            relationship_type,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSummary {
    pub total: usize,
    pub partners: usize,
    pub technical: usize,
    pub charity: usize,
    /// Nodes carrying the technical-account flag, whatever their sponsor.
    pub tech_accounts: usize,
    /// Deepest filled level, 0 when only the root is present.
    pub deepest: u32,
}

impl TreeSummary {
    pub fn tally(positions: &[PlacedNode]) -> Self {
        let mut summary = TreeSummary::default();
        for node in positions {
            summary.total += 1;
            match node.relationship_type {
                RelationshipType::Partner => summary.partners += 1,
                RelationshipType::Technical => summary.technical += 1,
                RelationshipType::Charity => summary.charity += 1,
            }
            if node.record.is_tech_account {
                summary.tech_accounts += 1;
            }
            summary.deepest = summary.deepest.max(node.depth);
        }
        summary
    }
}

/// Placement tree rooted at one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeView {
    /// `None` when the root is absent or a sentinel.
    pub root: Option<PlacedNode>,
    /// Filled positions below the root, ordered by depth then position.
    pub positions: Vec<PlacedNode>,
    pub summary: TreeSummary,
}

impl TreeView {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn root_only(root: PlacedNode) -> Self {
        Self {
            root: Some(root),
            positions: Vec::new(),
            summary: TreeSummary::default(),
        }
    }

    pub fn at(&self, depth: u32, position: u64) -> Option<&PlacedNode> {
        if depth == 0 {
            return self.root.as_ref().filter(|_| position == 0);
        }
        self.positions
            .iter()
            .find(|n| n.depth == depth && n.position == position)
    }
}

/// Team census of one identity across the sponsor graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CensusReport {
    /// Distinct first-line referrals.
    pub personal: usize,
    /// Team members whose activity check returned true.
    pub active: usize,
    /// Distinct team members across all levels.
    pub total: usize,
    /// `levels[i]` is the number of members first discovered at level `i + 1`.
    pub levels: Vec<usize>,
    /// Members whose activity check failed and were counted as not active.
    pub unverified: usize,
}

impl CensusReport {
    pub fn empty() -> Self {
        Self::default()
    }
}
