// Team census over the sponsor graph.
//
// Breadth-first and level-synchronous: level 1 is the root's direct referrals, each
// further level is the referrals of the previous one, up to `max_depth` levels.
//
// INVARIANTS:
// 1. An address is attributed to the level that first discovers it and is counted
//    exactly once; rediscoveries are dropped from expansion.
// 2. The root itself is never part of its own team, even if a cycle leads back to it.
// 3. Activity fails closed: a member whose check failed is counted in `total` but not
//    in `active`.

use std::collections::HashSet;
use tracing::{debug, info};

use refnet_core::{Address, NodeKey, TraversalConfig, TraversalError};
use refnet_query::{Activity, LedgerReader, NodeCache, NodeQuery};

use crate::view::CensusReport;

pub struct TeamCensus<'a, Q: NodeQuery + ?Sized> {
    query: &'a Q,
    config: &'a TraversalConfig,
}

impl<'a, Q: NodeQuery + ?Sized> TeamCensus<'a, Q> {
    pub fn new(query: &'a Q, config: &'a TraversalConfig) -> Self {
        Self { query, config }
    }

    /// Counts the team of `root`. A root given by id is resolved to its address first;
    /// an unknown root has an empty team.
    ///
    /// Level 1 is the first line, so at most `max_depth` levels are counted in total.
    pub async fn count(
        &self,
        root: &NodeKey,
        cache: &mut NodeCache,
    ) -> Result<CensusReport, TraversalError> {
        let mut reader = LedgerReader::new(self.query, cache, self.config);

        let root_address = match root {
            NodeKey::Address(address) if address.is_zero() => return Ok(CensusReport::empty()),
            NodeKey::Address(address) => address.clone(),
            NodeKey::Id(_) => match reader.node(root).await? {
                Some(record) => record.address,
                None => return Ok(CensusReport::empty()),
            },
        };

        let mut first_line = reader
            .direct_referrals(std::slice::from_ref(&root_address))
            .await?;
        let direct = first_line.remove(&root_address).unwrap_or_default();

        let mut visited: HashSet<Address> = HashSet::new();
        let mut team: Vec<Address> = Vec::new();
        let mut frontier: Vec<Address> = Vec::new();
        for address in direct {
            if address != root_address && visited.insert(address.clone()) {
                frontier.push(address);
            }
        }
        let personal = frontier.len();
        let mut levels = Vec::new();
        if personal > 0 {
            levels.push(personal);
        }
        team.extend(frontier.iter().cloned());

        let mut depth = 1;
        while !frontier.is_empty() && depth < self.config.max_depth {
            let referrals = reader.direct_referrals(&frontier).await?;

            let mut next = Vec::new();
            for sponsor in &frontier {
                for referral in referrals.get(sponsor).into_iter().flatten() {
                    if *referral != root_address && visited.insert(referral.clone()) {
                        next.push(referral.clone());
                    }
                }
            }

            depth += 1;
            debug!("Census level {} discovered {} new members", depth, next.len());
            if !next.is_empty() {
                levels.push(next.len());
            }
            team.extend(next.iter().cloned());
            frontier = next;
        }

        let activity = reader.activity(&team).await?;
        let active = activity.values().filter(|a| a.is_active()).count();
        let unverified = activity
            .values()
            .filter(|a| matches!(a, Activity::Unverified))
            .count();

        let report = CensusReport {
            personal,
            active,
            total: team.len(),
            levels,
            unverified,
        };
        info!(
            "Census for {}: personal={} total={} active={} unverified={}",
            root, report.personal, report.total, report.active, report.unverified
        );
        Ok(report)
    }
}
