// In-memory ledger backed by a JSON snapshot.
//
// Direct referrals are derived from each record's sponsor. Snapshots may also carry
// extra referral links, which is how spillover cross-links and data anomalies
// (one address reachable from several sponsors, sponsor cycles) are represented.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use refnet_core::{Address, LookupError, NodeId, NodeRecord, RawNodeRecord, RecordError, Standing};

use crate::NodeQuery;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid record in snapshot: {0}")]
    Record(#[from] RecordError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingEntry {
    pub id: NodeId,
    #[serde(flatten)]
    pub standing: Standing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralLink {
    pub sponsor: Address,
    pub referral: Address,
}

/// On-disk snapshot format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub nodes: Vec<RawNodeRecord>,
    #[serde(default)]
    pub standings: Vec<StandingEntry>,
    #[serde(default)]
    pub links: Vec<ReferralLink>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    by_id: HashMap<NodeId, NodeRecord>,
    by_address: HashMap<Address, NodeId>,
    sponsored: HashMap<NodeId, BTreeSet<NodeId>>,
    links: HashMap<Address, Vec<Address>>,
    standings: HashMap<NodeId, Standing>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = NodeRecord>) -> Self {
        let mut ledger = Self::new();
        for record in records {
            ledger.insert(record);
        }
        ledger
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, SnapshotError> {
        let mut ledger = Self::new();
        for raw in snapshot.nodes {
            if let Some(record) = raw.into_record()? {
                ledger.insert(record);
            }
        }
        for entry in snapshot.standings {
            ledger.set_standing(entry.id, entry.standing);
        }
        for link in snapshot.links {
            ledger.link_referral(&link.sponsor, link.referral);
        }
        Ok(ledger)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Self::from_snapshot(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let ledger = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!("Loaded {} nodes from snapshot {}", ledger.len(), path.display());
        Ok(ledger)
    }

    /// Registers a record under its sponsor. The sponsor does not need to be present yet.
    pub fn insert(&mut self, record: NodeRecord) {
        if let Some(sponsor) = record.sponsor_id {
            self.sponsored.entry(sponsor).or_default().insert(record.id);
        }
        self.by_address.insert(record.address.clone(), record.id);
        self.by_id.insert(record.id, record);
    }

    /// Adds a referral edge that is not implied by a sponsor id.
    pub fn link_referral(&mut self, sponsor: &Address, referral: Address) {
        let list = self.links.entry(sponsor.clone()).or_default();
        if !list.contains(&referral) {
            list.push(referral);
        }
    }

    /// Sponsored records in registration order, followed by extra links.
    fn referrals_of(&self, address: &Address) -> Vec<Address> {
        let mut referrals: Vec<Address> = self
            .by_address
            .get(address)
            .and_then(|id| self.sponsored.get(id))
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_id.get(id))
            .map(|record| record.address.clone())
            .collect();
        for extra in self.links.get(address).into_iter().flatten() {
            if !referrals.contains(extra) {
                referrals.push(extra.clone());
            }
        }
        referrals
    }

    pub fn set_standing(&mut self, id: NodeId, standing: Standing) {
        self.standings.insert(id, standing);
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[async_trait]
impl NodeQuery for MemoryLedger {
    async fn get_node_by_id(&self, id: NodeId) -> Result<Option<NodeRecord>, LookupError> {
        Ok(self.by_id.get(&id).cloned())
    }

    async fn get_node_by_address(
        &self,
        address: &Address,
    ) -> Result<Option<NodeRecord>, LookupError> {
        Ok(self
            .by_address
            .get(address)
            .and_then(|id| self.by_id.get(id))
            .cloned())
    }

    async fn get_direct_referrals(&self, address: &Address) -> Result<Vec<Address>, LookupError> {
        Ok(self.referrals_of(address))
    }

    async fn is_active(&self, address: &Address) -> Result<bool, LookupError> {
        Ok(self
            .by_address
            .get(address)
            .and_then(|id| self.by_id.get(id))
            .map(|record| record.is_active)
            .unwrap_or(false))
    }

    async fn get_standing(&self, id: NodeId) -> Result<Option<Standing>, LookupError> {
        Ok(self.standings.get(&id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "nodes": [
            { "id": 1, "address": "0x0000000000000000000000000000000000000001", "sponsorId": 0,
              "leftChildId": 2, "rightChildId": 3, "registeredAt": 100, "isActive": true },
            { "id": 2, "address": "0x0000000000000000000000000000000000000002", "sponsorId": 1,
              "registeredAt": 200, "isActive": true },
            { "id": 3, "address": "0x0000000000000000000000000000000000000003", "sponsorId": "1",
              "registeredAt": 300, "isActive": false },
            { "id": 0, "address": "0x0000000000000000000000000000000000000000" }
        ],
        "standings": [ { "id": 2, "maxLevel": 4, "rank": 1 } ],
        "links": [ { "sponsor": "0x0000000000000000000000000000000000000002",
                     "referral": "0x0000000000000000000000000000000000000003" } ]
    }"#;

    fn addr(v: u64) -> Address {
        Address::parse(&format!("0x{:040x}", v)).unwrap()
    }

    #[tokio::test]
    async fn test_snapshot_lookups() {
        let ledger = MemoryLedger::from_json(SNAPSHOT).unwrap();
        assert_eq!(ledger.len(), 3);

        let root = ledger.get_node_by_id(NodeId::new(1).unwrap()).await.unwrap().unwrap();
        assert_eq!(root.left_child_id, NodeId::new(2));
        let by_address = ledger.get_node_by_address(&addr(3)).await.unwrap().unwrap();
        assert_eq!(by_address.id.get(), 3);
        assert!(ledger.get_node_by_id(NodeId::new(99).unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_referrals_follow_sponsor_then_links() {
        let ledger = MemoryLedger::from_json(SNAPSHOT).unwrap();
        assert_eq!(
            ledger.get_direct_referrals(&addr(1)).await.unwrap(),
            vec![addr(2), addr(3)]
        );
        assert_eq!(ledger.get_direct_referrals(&addr(2)).await.unwrap(), vec![addr(3)]);
        assert!(ledger.get_direct_referrals(&addr(42)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activity_and_standing() {
        let ledger = MemoryLedger::from_json(SNAPSHOT).unwrap();
        assert!(ledger.is_active(&addr(2)).await.unwrap());
        assert!(!ledger.is_active(&addr(3)).await.unwrap());
        assert!(!ledger.is_active(&addr(77)).await.unwrap());

        let standing = ledger.get_standing(NodeId::new(2).unwrap()).await.unwrap();
        assert_eq!(standing, Some(Standing { max_level: 4, rank: 1 }));
    }

    #[test]
    fn test_bad_address_rejects_snapshot() {
        let bad = r#"{ "nodes": [ { "id": 1, "address": "0x12" } ] }"#;
        assert!(matches!(
            MemoryLedger::from_json(bad),
            Err(SnapshotError::Record(RecordError::InvalidAddress(_)))
        ));
    }
}
