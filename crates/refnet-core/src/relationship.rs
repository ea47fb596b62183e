use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::NodeRecord;
use crate::types::NodeId;

/// How a placed node relates to the identity a traversal was rooted at.
///
/// Purely presentational: classification never changes traversal control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
    /// First-line direct referral of the root.
    Partner,
    /// Operator-owned filler slot.
    Technical,
    /// Spillover placement from elsewhere in the sponsor graph.
    Charity,
}

impl RelationshipType {
    /// Classifies `record` relative to `root`.
    ///
    /// Technical accounts are excluded from partner/charity classification, so the
    /// technical check runs first.
    pub fn classify(record: &NodeRecord, root: NodeId, technical_sponsor: NodeId) -> Self {
        if record.is_tech_account || record.sponsor_id == Some(technical_sponsor) {
            RelationshipType::Technical
        } else if record.sponsor_id == Some(root) {
            RelationshipType::Partner
        } else {
            RelationshipType::Charity
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Partner => "partner",
            RelationshipType::Technical => "technical",
            RelationshipType::Charity => "charity",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Address;
    use chrono::{DateTime, Utc};

    const TECH: u64 = 7_777_777;

    fn id(v: u64) -> NodeId {
        NodeId::new(v).unwrap()
    }

    fn node(sponsor: u64, tech: bool) -> NodeRecord {
        NodeRecord {
            id: id(9),
            address: Address::parse("0x0000000000000000000000000000000000000009").unwrap(),
            sponsor_id: NodeId::new(sponsor),
            left_child_id: None,
            right_child_id: None,
            registered_at: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            is_active: true,
            is_tech_account: tech,
            standing: None,
        }
    }

    #[test]
    fn test_sponsor_equal_to_root_is_partner() {
        assert_eq!(
            RelationshipType::classify(&node(1, false), id(1), id(TECH)),
            RelationshipType::Partner
        );
    }

    #[test]
    fn test_technical_sentinel_sponsor() {
        assert_eq!(
            RelationshipType::classify(&node(TECH, false), id(1), id(TECH)),
            RelationshipType::Technical
        );
    }

    #[test]
    fn test_tech_flag_wins_over_partner() {
        assert_eq!(
            RelationshipType::classify(&node(1, true), id(1), id(TECH)),
            RelationshipType::Technical
        );
    }

    #[test]
    fn test_other_sponsor_is_charity() {
        assert_eq!(
            RelationshipType::classify(&node(3, false), id(1), id(TECH)),
            RelationshipType::Charity
        );
        assert_eq!(
            RelationshipType::classify(&node(0, false), id(1), id(TECH)),
            RelationshipType::Charity
        );
    }

    #[test]
    fn test_injected_sentinel_is_respected() {
        // A deployment using a different sentinel must not classify 7777777 as technical.
        assert_eq!(
            RelationshipType::classify(&node(TECH, false), id(1), id(4242)),
            RelationshipType::Charity
        );
    }
}
