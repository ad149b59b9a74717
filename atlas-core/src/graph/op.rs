use std::collections::BTreeMap;
use std::fmt;

use atlas_model::{NodeRef, PropertyValue, RelDirection, UpdateTag};

/// One relationship hop in a sub-graph path, read away from the anchor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hop {
    pub rel_type: String,
    pub direction: RelDirection,
    /// Label of the node this hop arrives at.
    pub label: String,
}

impl Hop {
    pub fn outgoing(rel_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            rel_type: rel_type.into(),
            direction: RelDirection::Outgoing,
            label: label.into(),
        }
    }

    pub fn incoming(rel_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            rel_type: rel_type.into(),
            direction: RelDirection::Incoming,
            label: label.into(),
        }
    }
}

/// Anchored path that scopes a stale sweep to one parent instance's
/// sub-graph. Never matches by label alone: the anchor join is what keeps
/// a sweep of one tenant from touching another tenant's data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaleScope {
    pub anchor: NodeRef,
    pub hops: Vec<Hop>,
}

impl StaleScope {
    /// Label of the node at the end of the path, the one the sweep deletes.
    pub fn terminal_label(&self) -> Option<&str> {
        self.hops.last().map(|hop| hop.label.as_str())
    }
}

/// Idempotent node write: create-if-absent / update-if-present by natural
/// key, stamping `firstseen` only on creation and `lastupdated` on every
/// touch.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeNode {
    pub node: NodeRef,
    pub properties: BTreeMap<String, PropertyValue>,
    pub tag: UpdateTag,
}

/// Idempotent relationship write between two existing nodes. A missing
/// endpoint makes the merge a no-op, matching match-then-merge statement
/// semantics on the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeRelationship {
    pub start: NodeRef,
    pub rel_type: String,
    pub end: NodeRef,
    pub properties: BTreeMap<String, PropertyValue>,
    pub tag: UpdateTag,
}

/// One typed operation a [`GraphSession`](crate::graph::session::GraphSession)
/// executes in its own transaction. The session reports how many records
/// the operation affected, which the batched cleanup loop uses as its
/// termination condition.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphOp {
    MergeNode(MergeNode),
    MergeRelationship(MergeRelationship),
    /// Delete up to `limit` stale relationships at the last hop of the
    /// scope whose terminal node is still current.
    DeleteStaleRelationships {
        scope: StaleScope,
        tag: UpdateTag,
        limit: u64,
    },
    /// Detach-delete up to `limit` stale terminal nodes of the scope.
    DeleteStaleNodes {
        scope: StaleScope,
        tag: UpdateTag,
        limit: u64,
    },
    /// Ensure the key-uniqueness constraint merge-by-key relies on.
    EnsureUniqueConstraint {
        label: String,
        key_property: String,
    },
}

impl GraphOp {
    pub fn kind(&self) -> &'static str {
        match self {
            GraphOp::MergeNode(_) => "merge_node",
            GraphOp::MergeRelationship(_) => "merge_relationship",
            GraphOp::DeleteStaleRelationships { .. } => "delete_stale_relationships",
            GraphOp::DeleteStaleNodes { .. } => "delete_stale_nodes",
            GraphOp::EnsureUniqueConstraint { .. } => "ensure_unique_constraint",
        }
    }
}

impl fmt::Display for GraphOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphOp::MergeNode(merge) => write!(f, "merge_node {}", merge.node),
            GraphOp::MergeRelationship(merge) => write!(
                f,
                "merge_relationship {}-[:{}]->{}",
                merge.start, merge.rel_type, merge.end
            ),
            GraphOp::DeleteStaleRelationships { scope, .. } => write!(
                f,
                "delete_stale_relationships under {}",
                scope.anchor
            ),
            GraphOp::DeleteStaleNodes { scope, .. } => {
                write!(f, "delete_stale_nodes under {}", scope.anchor)
            }
            GraphOp::EnsureUniqueConstraint {
                label,
                key_property,
            } => write!(f, "ensure_unique_constraint {label}.{key_property}"),
        }
    }
}
