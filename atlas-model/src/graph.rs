use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::PropertyValue;

/// Reference to a node by label and natural key.
///
/// Node identity throughout Atlas is `label` plus the value of one key
/// property; the store's uniqueness constraint on that pair is what makes
/// merge-by-key idempotent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub label: String,
    pub key_property: String,
    pub key: String,
}

impl NodeRef {
    pub fn new(
        label: impl Into<String>,
        key_property: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            key_property: key_property.into(),
            key: key.into(),
        }
    }

    /// Shorthand for the common case where the key property is `id`.
    pub fn with_id(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(label, "id", key)
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(:{}{{{}: {}}})", self.label, self.key_property, self.key)
    }
}

/// Traversal direction of one relationship hop, read from the parent side.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RelDirection {
    /// Parent points at child: `(parent)-[r]->(child)`.
    Outgoing,
    /// Child points at parent: `(parent)<-[r]-(child)`.
    Incoming,
}

/// Materialized node state as the store holds it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub label: String,
    pub key_property: String,
    pub key: String,
    pub properties: BTreeMap<String, PropertyValue>,
    /// Tag of the run that created the node. Never updated afterwards.
    pub firstseen: i64,
    /// Tag of the run that last touched the node.
    pub lastupdated: i64,
}

impl GraphNode {
    pub fn node_ref(&self) -> NodeRef {
        NodeRef::new(
            self.label.clone(),
            self.key_property.clone(),
            self.key.clone(),
        )
    }
}

/// Materialized relationship state as the store holds it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphRelationship {
    pub start: NodeRef,
    pub rel_type: String,
    pub end: NodeRef,
    pub properties: BTreeMap<String, PropertyValue>,
    pub firstseen: i64,
    pub lastupdated: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ref_display_names_label_and_key() {
        let node = NodeRef::with_id("EC2Instance", "i-0abc");
        assert_eq!(node.to_string(), "(:EC2Instance{id: i-0abc})");
    }

    #[test]
    fn with_id_uses_id_key_property() {
        let node = NodeRef::with_id("AWSAccount", "000000000000");
        assert_eq!(node.key_property, "id");
    }
}
