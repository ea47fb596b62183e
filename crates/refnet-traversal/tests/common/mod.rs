// Shared fixtures for traversal tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use refnet_core::{Address, LookupError, NodeId, NodeRecord, Standing};
use refnet_query::{MemoryLedger, NodeQuery};

pub const TECH: u64 = 7_777_777;

pub fn id(v: u64) -> NodeId {
    NodeId::new(v).expect("fixture ids are non-zero")
}

pub fn addr(v: u64) -> Address {
    Address::parse(&format!("0x{:040x}", v)).expect("fixture address")
}

/// Active node with the given sponsor and child slots (0 = none).
pub fn node(v: u64, sponsor: u64, left: u64, right: u64) -> NodeRecord {
    NodeRecord {
        id: id(v),
        address: addr(v),
        sponsor_id: NodeId::new(sponsor),
        left_child_id: NodeId::new(left),
        right_child_id: NodeId::new(right),
        registered_at: DateTime::<Utc>::from_timestamp(1_700_000_000 + v as i64, 0)
            .expect("fixture timestamp"),
        is_active: true,
        is_tech_account: false,
        standing: None,
    }
}

pub fn inactive(mut record: NodeRecord) -> NodeRecord {
    record.is_active = false;
    record
}

pub fn tech(mut record: NodeRecord) -> NodeRecord {
    record.is_tech_account = true;
    record
}

/// Wraps a `MemoryLedger`, injecting failures for chosen keys and counting calls.
#[derive(Default)]
pub struct FlakyLedger {
    pub inner: MemoryLedger,
    pub failing_ids: HashSet<NodeId>,
    pub failing_referrals: HashSet<Address>,
    pub failing_activity: HashSet<Address>,
    pub refusing_ids: HashSet<NodeId>,
    pub refusing_activity: HashSet<Address>,
    pub offline: bool,
    pub node_calls: AtomicUsize,
    pub referral_calls: AtomicUsize,
    pub activity_calls: AtomicUsize,
}

impl FlakyLedger {
    pub fn new(inner: MemoryLedger) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn node_calls(&self) -> usize {
        self.node_calls.load(Ordering::SeqCst)
    }

    pub fn referral_calls(&self) -> usize {
        self.referral_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), LookupError> {
        if self.offline {
            Err(refused())
        } else {
            Ok(())
        }
    }
}

fn timeout() -> LookupError {
    LookupError::Transient("timed out".into())
}

fn refused() -> LookupError {
    LookupError::Unavailable("connection refused".into())
}

#[async_trait]
impl NodeQuery for FlakyLedger {
    async fn get_node_by_id(&self, id: NodeId) -> Result<Option<NodeRecord>, LookupError> {
        self.node_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.failing_ids.contains(&id) {
            return Err(timeout());
        }
        if self.refusing_ids.contains(&id) {
            return Err(refused());
        }
        self.inner.get_node_by_id(id).await
    }

    async fn get_node_by_address(
        &self,
        address: &Address,
    ) -> Result<Option<NodeRecord>, LookupError> {
        self.node_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.inner.get_node_by_address(address).await
    }

    async fn get_direct_referrals(&self, address: &Address) -> Result<Vec<Address>, LookupError> {
        self.referral_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.failing_referrals.contains(address) {
            return Err(timeout());
        }
        self.inner.get_direct_referrals(address).await
    }

    async fn is_active(&self, address: &Address) -> Result<bool, LookupError> {
        self.activity_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.failing_activity.contains(address) {
            return Err(timeout());
        }
        if self.refusing_activity.contains(address) {
            return Err(refused());
        }
        self.inner.is_active(address).await
    }

    async fn get_standing(&self, id: NodeId) -> Result<Option<Standing>, LookupError> {
        self.check_online()?;
        self.inner.get_standing(id).await
    }
}

/// Complete binary tree of active nodes with ids 1..=count in heap order, every node
/// sponsored by node 1.
pub fn complete_tree(count: u64) -> MemoryLedger {
    MemoryLedger::from_records((1..=count).map(|v| {
        let left = if 2 * v <= count { 2 * v } else { 0 };
        let right = if 2 * v + 1 <= count { 2 * v + 1 } else { 0 };
        let sponsor = if v == 1 { 0 } else { 1 };
        node(v, sponsor, left, right)
    }))
}
