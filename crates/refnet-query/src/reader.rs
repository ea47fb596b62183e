// Ledger reader: query + cache + batching, with the degradation policy applied.
//
// POLICY:
// 1. Sentinel keys (zero id, zero address) are short-circuited before any fetch.
// 2. A transient failure degrades the key: absent node, empty referral list,
//    unverified activity. It is never surfaced.
// 3. `Unavailable` that survives batching (a lone lookup, or a chunk in which nothing
//    succeeded) aborts the call with `TraversalError::Unavailable`.

use std::collections::HashMap;
use std::fmt::Display;
use tracing::{debug, warn};

use refnet_core::{
    Address, LookupError, NodeId, NodeKey, NodeRecord, TraversalConfig, TraversalError,
};

use crate::batch::BatchedFetcher;
use crate::cache::NodeCache;
use crate::NodeQuery;

/// Outcome of one activity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Active,
    Inactive,
    /// The check failed; counted as not active.
    Unverified,
}

impl Activity {
    pub fn is_active(&self) -> bool {
        matches!(self, Activity::Active)
    }
}

pub struct LedgerReader<'a, Q: NodeQuery + ?Sized> {
    query: &'a Q,
    cache: &'a mut NodeCache,
    config: &'a TraversalConfig,
}

impl<'a, Q: NodeQuery + ?Sized> LedgerReader<'a, Q> {
    pub fn new(query: &'a Q, cache: &'a mut NodeCache, config: &'a TraversalConfig) -> Self {
        Self {
            query,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &TraversalConfig {
        self.config
    }

    /// Fetches a single node, consulting the cache first.
    pub async fn node(&mut self, key: &NodeKey) -> Result<Option<NodeRecord>, TraversalError> {
        if let NodeKey::Address(address) = key {
            if address.is_zero() {
                return Ok(None);
            }
        }
        if let Some(record) = self.cache.get_key(key) {
            return Ok(Some(record));
        }

        let outcome = match key {
            NodeKey::Id(id) => self.query.get_node_by_id(*id).await,
            NodeKey::Address(address) => self.query.get_node_by_address(address).await,
        };
        let record = match degrade(key, outcome)? {
            Some(Some(record)) => record,
            _ => return Ok(None),
        };

        let record = if self.config.fetch_standing {
            match self.with_standing(vec![record]).await?.pop() {
                Some(record) => record,
                None => return Ok(None),
            }
        } else {
            record
        };
        self.cache.put(record.clone());
        Ok(Some(record))
    }

    /// Fetches many nodes by id in batches of `node_batch_size`.
    ///
    /// Absent and failed ids are simply missing from the returned map.
    pub async fn nodes_by_id(
        &mut self,
        ids: &[NodeId],
    ) -> Result<HashMap<NodeId, NodeRecord>, TraversalError> {
        let mut found = HashMap::with_capacity(ids.len());
        let mut missing = Vec::new();
        for id in ids {
            match self.cache.get(*id) {
                Some(record) => {
                    found.insert(*id, record);
                }
                None => missing.push(*id),
            }
        }
        if missing.is_empty() {
            return Ok(found);
        }

        let query = self.query;
        let fetched = BatchedFetcher::new(self.config.node_batch_size)
            .fetch_all(missing, |id: NodeId| query.get_node_by_id(id))
            .await;

        let mut fresh = Vec::new();
        for (id, outcome) in fetched {
            if let Some(Some(record)) = degrade(&id, outcome)? {
                fresh.push(record);
            }
        }
        if self.config.fetch_standing {
            fresh = self.with_standing(fresh).await?;
        }
        for record in fresh {
            self.cache.put(record.clone());
            found.insert(record.id, record);
        }
        Ok(found)
    }

    /// First-line referrals for each address, in batches of `referral_batch_size`.
    ///
    /// A failed lookup yields an empty list for that address.
    pub async fn direct_referrals(
        &mut self,
        addresses: &[Address],
    ) -> Result<HashMap<Address, Vec<Address>>, TraversalError> {
        let query = self.query;
        let fetched = BatchedFetcher::new(self.config.referral_batch_size)
            .fetch_all(
                addresses.iter().filter(|a| !a.is_zero()).cloned(),
                |address: Address| async move { query.get_direct_referrals(&address).await },
            )
            .await;

        let mut referrals = HashMap::with_capacity(fetched.len());
        for (address, outcome) in fetched {
            let list = degrade(&address, outcome)?
                .unwrap_or_default()
                .into_iter()
                .filter(|r| !r.is_zero())
                .collect();
            referrals.insert(address, list);
        }
        Ok(referrals)
    }

    /// Activity flag for each address, in batches of `activity_batch_size`.
    pub async fn activity(
        &mut self,
        addresses: &[Address],
    ) -> Result<HashMap<Address, Activity>, TraversalError> {
        let query = self.query;
        let fetched = BatchedFetcher::new(self.config.activity_batch_size)
            .fetch_all(addresses.iter().cloned(), |address: Address| async move {
                query.is_active(&address).await
            })
            .await;

        let mut tally = HashMap::with_capacity(fetched.len());
        for (address, outcome) in fetched {
            let activity = match degrade(&address, outcome)? {
                Some(true) => Activity::Active,
                Some(false) => Activity::Inactive,
                None => Activity::Unverified,
            };
            tally.insert(address, activity);
        }
        Ok(tally)
    }

    async fn with_standing(
        &mut self,
        records: Vec<NodeRecord>,
    ) -> Result<Vec<NodeRecord>, TraversalError> {
        let query = self.query;
        let ids: Vec<NodeId> = records.iter().map(|r| r.id).collect();
        let fetched = BatchedFetcher::new(self.config.node_batch_size)
            .fetch_all(ids, |id: NodeId| query.get_standing(id))
            .await;

        let mut standings = HashMap::with_capacity(fetched.len());
        for (id, outcome) in fetched {
            if let Some(Some(standing)) = degrade(&id, outcome)? {
                standings.insert(id, standing);
            }
        }
        debug!("Fetched standing for {}/{} nodes", standings.len(), records.len());

        Ok(records
            .into_iter()
            .map(|mut record| {
                record.standing = standings.get(&record.id).copied();
                record
            })
            .collect())
    }
}

/// Applies the degradation policy to one lookup outcome.
///
/// `Ok(Some(v))` for a successful lookup, `Ok(None)` for a degraded one.
fn degrade<K: Display + ?Sized, V>(
    key: &K,
    outcome: Result<V, LookupError>,
) -> Result<Option<V>, TraversalError> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(LookupError::Unavailable(msg)) => Err(TraversalError::Unavailable(msg)),
        Err(err @ LookupError::Transient(_)) => {
            warn!("Treating {} as absent: {}", key, err);
            Ok(None)
        }
    }
}
