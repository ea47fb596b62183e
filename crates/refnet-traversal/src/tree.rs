// Binary placement tree reconstruction.
//
// INVARIANTS:
// 1. Expansion is level-synchronous and iterative; every level's child lookups go
//    through the batched reader, so no level issues more than `node_batch_size`
//    lookups at once.
// 2. Nothing below `max_depth` is materialized. Reaching the bound is a normal stop.
// 3. Inactive, absent and failed nodes are not placed, and their child ids are never
//    dereferenced.
// 4. A node id is placed at most once, so corrupted child pointers cannot loop.

use std::collections::HashSet;
use tracing::{debug, info, warn};

use refnet_core::{NodeId, NodeKey, TraversalConfig, TraversalError};
use refnet_query::{LedgerReader, NodeCache, NodeQuery};

use crate::view::{PlacedNode, TreeSummary, TreeView};

/// A child slot waiting to be fetched.
#[derive(Debug, Clone, Copy)]
struct Slot {
    id: NodeId,
    depth: u32,
    position: u64,
}

pub struct TreeReconstructor<'a, Q: NodeQuery + ?Sized> {
    query: &'a Q,
    config: &'a TraversalConfig,
}

impl<'a, Q: NodeQuery + ?Sized> TreeReconstructor<'a, Q> {
    pub fn new(query: &'a Q, config: &'a TraversalConfig) -> Self {
        Self { query, config }
    }

    /// Builds the placement tree below `root` using `cache` for memoization.
    ///
    /// An absent root yields an empty view; an inactive root yields the root alone.
    pub async fn reconstruct(
        &self,
        root: &NodeKey,
        cache: &mut NodeCache,
    ) -> Result<TreeView, TraversalError> {
        let technical = self.config.technical_sponsor_id;
        let max_depth = self.config.max_depth;
        let mut reader = LedgerReader::new(self.query, cache, self.config);

        let root_record = match reader.node(root).await? {
            Some(record) => record,
            None => {
                debug!("Tree root {} is absent", root);
                return Ok(TreeView::empty());
            }
        };
        let root_id = root_record.id;
        if !root_record.is_active {
            debug!("Tree root {} is inactive", root);
            return Ok(TreeView::root_only(PlacedNode::new(
                root_record,
                0,
                0,
                root_id,
                technical,
            )));
        }

        let mut placed: HashSet<NodeId> = HashSet::from([root_id]);
        let mut frontier = child_slots(root_record.expandable_children(), 0, 0);
        let mut positions = Vec::new();

        while !frontier.is_empty() {
            let ids: Vec<NodeId> = frontier.iter().map(|slot| slot.id).collect();
            let fetched = reader.nodes_by_id(&ids).await?;

            let mut next = Vec::new();
            for slot in frontier {
                let record = match fetched.get(&slot.id) {
                    Some(record) if record.is_active => record.clone(),
                    _ => continue,
                };
                if !placed.insert(record.id) {
                    warn!(
                        "Node {} already placed, skipping duplicate at depth {} position {}",
                        record.id, slot.depth, slot.position
                    );
                    continue;
                }
                if slot.depth < max_depth {
                    next.extend(child_slots(
                        record.expandable_children(),
                        slot.depth,
                        slot.position,
                    ));
                }
                positions.push(PlacedNode::new(
                    record,
                    slot.depth,
                    slot.position,
                    root_id,
                    technical,
                ));
            }
            frontier = next;
        }

        let summary = TreeSummary::tally(&positions);
        info!(
            "Reconstructed tree for {}: {} nodes, deepest level {}",
            root, summary.total, summary.deepest
        );

        Ok(TreeView {
            root: Some(PlacedNode::new(root_record, 0, 0, root_id, technical)),
            positions,
            summary,
        })
    }
}

fn child_slots(children: [Option<NodeId>; 2], depth: u32, position: u64) -> Vec<Slot> {
    children
        .iter()
        .enumerate()
        .filter_map(|(offset, child)| {
            child.map(|id| Slot {
                id,
                depth: depth + 1,
                position: position * 2 + offset as u64,
            })
        })
        .collect()
}
