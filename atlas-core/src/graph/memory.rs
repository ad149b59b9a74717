//! In-process property graph backend.
//!
//! Complete enough to honor every [`GraphOp`] contract: merge-by-key with
//! `firstseen`/`lastupdated` stamping, anchored stale sweeps with batch
//! limits, and detach-delete. Backs `memory://` store URIs and the whole
//! test suite.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use atlas_model::{
    GraphNode, GraphRelationship, NodeRef, PropertyValue, RelDirection, UpdateTag,
};

use crate::graph::op::{GraphOp, Hop, MergeNode, MergeRelationship, StaleScope};
use crate::graph::session::{GraphSession, GraphStore, StoreError};

type NodeId = u64;
type RelId = u64;

#[derive(Clone, Debug)]
struct NodeRecord {
    label: String,
    key_property: String,
    key: String,
    properties: BTreeMap<String, PropertyValue>,
    firstseen: i64,
    lastupdated: i64,
}

#[derive(Clone, Debug)]
struct RelRecord {
    start: NodeId,
    rel_type: String,
    end: NodeId,
    properties: BTreeMap<String, PropertyValue>,
    firstseen: i64,
    lastupdated: i64,
}

#[derive(Debug, Default)]
struct GraphData {
    nodes: HashMap<NodeId, NodeRecord>,
    node_index: HashMap<(String, String, String), NodeId>,
    rels: HashMap<RelId, RelRecord>,
    rel_index: HashMap<(NodeId, String, NodeId), RelId>,
    constraints: HashSet<(String, String)>,
    next_id: u64,
}

impl GraphData {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn node_id(&self, node: &NodeRef) -> Option<NodeId> {
        self.node_index
            .get(&(
                node.label.clone(),
                node.key_property.clone(),
                node.key.clone(),
            ))
            .copied()
    }

    fn merge_node(&mut self, merge: &MergeNode) -> u64 {
        let tag = merge.tag.as_i64();
        if let Some(id) = self.node_id(&merge.node)
            && let Some(record) = self.nodes.get_mut(&id)
        {
            record
                .properties
                .extend(merge.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
            record.lastupdated = tag;
            return 1;
        }

        let id = self.next_id();
        self.nodes.insert(
            id,
            NodeRecord {
                label: merge.node.label.clone(),
                key_property: merge.node.key_property.clone(),
                key: merge.node.key.clone(),
                properties: merge.properties.clone(),
                firstseen: tag,
                lastupdated: tag,
            },
        );
        self.node_index.insert(
            (
                merge.node.label.clone(),
                merge.node.key_property.clone(),
                merge.node.key.clone(),
            ),
            id,
        );
        1
    }

    fn merge_relationship(&mut self, merge: &MergeRelationship) -> u64 {
        let tag = merge.tag.as_i64();
        // MATCH-then-MERGE semantics: a missing endpoint makes this a no-op.
        let (Some(start), Some(end)) =
            (self.node_id(&merge.start), self.node_id(&merge.end))
        else {
            return 0;
        };
        let index_key = (start, merge.rel_type.clone(), end);
        if let Some(&id) = self.rel_index.get(&index_key)
            && let Some(record) = self.rels.get_mut(&id)
        {
            record
                .properties
                .extend(merge.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
            record.lastupdated = tag;
            return 1;
        }

        let id = self.next_id();
        self.rels.insert(
            id,
            RelRecord {
                start,
                rel_type: merge.rel_type.clone(),
                end,
                properties: merge.properties.clone(),
                firstseen: tag,
                lastupdated: tag,
            },
        );
        self.rel_index.insert(index_key, id);
        1
    }

    /// Nodes reachable from the anchor through all but the final hop.
    fn frontier_before_last(&self, scope: &StaleScope) -> BTreeSet<NodeId> {
        let mut frontier = BTreeSet::new();
        let Some(anchor) = self.node_id(&scope.anchor) else {
            return frontier;
        };
        frontier.insert(anchor);
        let hop_count = scope.hops.len();
        for hop in &scope.hops[..hop_count.saturating_sub(1)] {
            frontier = self.advance(&frontier, hop);
        }
        frontier
    }

    fn advance(&self, frontier: &BTreeSet<NodeId>, hop: &Hop) -> BTreeSet<NodeId> {
        let mut next = BTreeSet::new();
        for rel in self.rels.values() {
            if rel.rel_type != hop.rel_type {
                continue;
            }
            let (from, to) = match hop.direction {
                RelDirection::Outgoing => (rel.start, rel.end),
                RelDirection::Incoming => (rel.end, rel.start),
            };
            if !frontier.contains(&from) {
                continue;
            }
            if self
                .nodes
                .get(&to)
                .is_some_and(|node| node.label == hop.label)
            {
                next.insert(to);
            }
        }
        next
    }

    /// Final-hop matches as (relationship, terminal node) pairs, ordered
    /// by relationship id for deterministic batching.
    fn terminal_matches(&self, scope: &StaleScope) -> Vec<(RelId, NodeId)> {
        let Some(last) = scope.hops.last() else {
            return Vec::new();
        };
        let frontier = self.frontier_before_last(scope);
        let mut matches = Vec::new();
        for (&rel_id, rel) in &self.rels {
            if rel.rel_type != last.rel_type {
                continue;
            }
            let (from, to) = match last.direction {
                RelDirection::Outgoing => (rel.start, rel.end),
                RelDirection::Incoming => (rel.end, rel.start),
            };
            if !frontier.contains(&from) {
                continue;
            }
            if self
                .nodes
                .get(&to)
                .is_some_and(|node| node.label == last.label)
            {
                matches.push((rel_id, to));
            }
        }
        matches.sort_unstable();
        matches
    }

    fn delete_stale_relationships(
        &mut self,
        scope: &StaleScope,
        tag: UpdateTag,
        limit: u64,
    ) -> u64 {
        let tag = tag.as_i64();
        let doomed: Vec<RelId> = self
            .terminal_matches(scope)
            .into_iter()
            .filter(|(rel_id, node_id)| {
                let rel_stale = self
                    .rels
                    .get(rel_id)
                    .is_some_and(|rel| rel.lastupdated != tag);
                let node_fresh = self
                    .nodes
                    .get(node_id)
                    .is_some_and(|node| node.lastupdated == tag);
                rel_stale && node_fresh
            })
            .map(|(rel_id, _)| rel_id)
            .take(limit as usize)
            .collect();
        for rel_id in &doomed {
            self.remove_rel(*rel_id);
        }
        doomed.len() as u64
    }

    fn delete_stale_nodes(
        &mut self,
        scope: &StaleScope,
        tag: UpdateTag,
        limit: u64,
    ) -> u64 {
        let tag = tag.as_i64();
        let mut doomed: Vec<NodeId> = self
            .terminal_matches(scope)
            .into_iter()
            .map(|(_, node_id)| node_id)
            .filter(|node_id| {
                self.nodes
                    .get(node_id)
                    .is_some_and(|node| node.lastupdated != tag)
            })
            .collect();
        doomed.sort_unstable();
        doomed.dedup();
        doomed.truncate(limit as usize);
        for node_id in &doomed {
            self.detach_delete_node(*node_id);
        }
        doomed.len() as u64
    }

    fn remove_rel(&mut self, rel_id: RelId) {
        if let Some(rel) = self.rels.remove(&rel_id) {
            self.rel_index
                .remove(&(rel.start, rel.rel_type.clone(), rel.end));
        }
    }

    fn detach_delete_node(&mut self, node_id: NodeId) {
        let attached: Vec<RelId> = self
            .rels
            .iter()
            .filter(|(_, rel)| rel.start == node_id || rel.end == node_id)
            .map(|(&id, _)| id)
            .collect();
        for rel_id in attached {
            self.remove_rel(rel_id);
        }
        if let Some(node) = self.nodes.remove(&node_id) {
            self.node_index
                .remove(&(node.label, node.key_property, node.key));
        }
    }

    fn node_ref_for(&self, node_id: NodeId) -> Option<NodeRef> {
        self.nodes.get(&node_id).map(|node| {
            NodeRef::new(
                node.label.clone(),
                node.key_property.clone(),
                node.key.clone(),
            )
        })
    }
}

/// Shared in-memory store. Cloning the handle shares the same graph.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<GraphData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all nodes, for assertions and dry-run inspection.
    pub async fn nodes(&self) -> Vec<GraphNode> {
        let data = self.data.lock().await;
        let mut nodes: Vec<GraphNode> = data
            .nodes
            .values()
            .map(|node| GraphNode {
                label: node.label.clone(),
                key_property: node.key_property.clone(),
                key: node.key.clone(),
                properties: node.properties.clone(),
                firstseen: node.firstseen,
                lastupdated: node.lastupdated,
            })
            .collect();
        nodes.sort_by(|a, b| (&a.label, &a.key).cmp(&(&b.label, &b.key)));
        nodes
    }

    pub async fn relationships(&self) -> Vec<GraphRelationship> {
        let data = self.data.lock().await;
        let mut rels: Vec<GraphRelationship> = data
            .rels
            .values()
            .filter_map(|rel| {
                Some(GraphRelationship {
                    start: data.node_ref_for(rel.start)?,
                    rel_type: rel.rel_type.clone(),
                    end: data.node_ref_for(rel.end)?,
                    properties: rel.properties.clone(),
                    firstseen: rel.firstseen,
                    lastupdated: rel.lastupdated,
                })
            })
            .collect();
        rels.sort_by(|a, b| {
            (&a.start.key, &a.rel_type, &a.end.key)
                .cmp(&(&b.start.key, &b.rel_type, &b.end.key))
        });
        rels
    }

    pub async fn node(&self, label: &str, key: &str) -> Option<GraphNode> {
        self.nodes()
            .await
            .into_iter()
            .find(|node| node.label == label && node.key == key)
    }

    pub async fn constraints(&self) -> Vec<(String, String)> {
        let data = self.data.lock().await;
        let mut constraints: Vec<(String, String)> =
            data.constraints.iter().cloned().collect();
        constraints.sort();
        constraints
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn session(&self) -> Result<Box<dyn GraphSession>, StoreError> {
        Ok(Box::new(MemorySession {
            data: Arc::clone(&self.data),
            closed: AtomicBool::new(false),
        }))
    }
}

#[derive(Debug)]
pub struct MemorySession {
    data: Arc<Mutex<GraphData>>,
    closed: AtomicBool,
}

#[async_trait]
impl GraphSession for MemorySession {
    async fn run(&self, op: &GraphOp) -> Result<u64, StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::SessionClosed);
        }
        let mut data = self.data.lock().await;
        let affected = match op {
            GraphOp::MergeNode(merge) => data.merge_node(merge),
            GraphOp::MergeRelationship(merge) => data.merge_relationship(merge),
            GraphOp::DeleteStaleRelationships { scope, tag, limit } => {
                data.delete_stale_relationships(scope, *tag, *limit)
            }
            GraphOp::DeleteStaleNodes { scope, tag, limit } => {
                data.delete_stale_nodes(scope, *tag, *limit)
            }
            GraphOp::EnsureUniqueConstraint {
                label,
                key_property,
            } => {
                let inserted = data
                    .constraints
                    .insert((label.clone(), key_property.clone()));
                u64::from(inserted)
            }
        };
        Ok(affected)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
