//! Parameterized statement rendering for wire backends.
//!
//! Each [`GraphOp`] renders to one merge-by-key or batched-delete
//! statement with named parameters. Rendering is pure: the driver that
//! ships statements over the wire is an external collaborator.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use atlas_model::RelDirection;

use crate::graph::op::{GraphOp, MergeNode, MergeRelationship, StaleScope};

/// One statement ready for a parameter-binding driver.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub query: String,
    pub parameters: BTreeMap<String, Value>,
}

pub fn render(op: &GraphOp) -> Statement {
    match op {
        GraphOp::MergeNode(merge) => render_merge_node(merge),
        GraphOp::MergeRelationship(merge) => render_merge_relationship(merge),
        GraphOp::DeleteStaleRelationships { scope, tag, limit } => {
            render_stale_relationships(scope, tag.as_i64(), *limit)
        }
        GraphOp::DeleteStaleNodes { scope, tag, limit } => {
            render_stale_nodes(scope, tag.as_i64(), *limit)
        }
        GraphOp::EnsureUniqueConstraint {
            label,
            key_property,
        } => Statement {
            query: format!(
                "CREATE CONSTRAINT IF NOT EXISTS FOR (n:{label}) REQUIRE n.{key_property} IS UNIQUE"
            ),
            parameters: BTreeMap::new(),
        },
    }
}

fn render_merge_node(merge: &MergeNode) -> Statement {
    let query = format!(
        "MERGE (n:{label}{{{key_property}: $key}}) \
         ON CREATE SET n.firstseen = $update_tag \
         SET n += $props, n.lastupdated = $update_tag",
        label = merge.node.label,
        key_property = merge.node.key_property,
    );
    let mut parameters = BTreeMap::new();
    parameters.insert("key".to_string(), json!(merge.node.key));
    parameters.insert("update_tag".to_string(), json!(merge.tag.as_i64()));
    parameters.insert("props".to_string(), props_value(&merge.properties));
    Statement { query, parameters }
}

fn render_merge_relationship(merge: &MergeRelationship) -> Statement {
    let query = format!(
        "MATCH (a:{start_label}{{{start_key}: $start_key}}) \
         MATCH (b:{end_label}{{{end_key}: $end_key}}) \
         MERGE (a)-[r:{rel_type}]->(b) \
         ON CREATE SET r.firstseen = $update_tag \
         SET r += $props, r.lastupdated = $update_tag",
        start_label = merge.start.label,
        start_key = merge.start.key_property,
        end_label = merge.end.label,
        end_key = merge.end.key_property,
        rel_type = merge.rel_type,
    );
    let mut parameters = BTreeMap::new();
    parameters.insert("start_key".to_string(), json!(merge.start.key));
    parameters.insert("end_key".to_string(), json!(merge.end.key));
    parameters.insert("update_tag".to_string(), json!(merge.tag.as_i64()));
    parameters.insert("props".to_string(), props_value(&merge.properties));
    Statement { query, parameters }
}

fn render_stale_relationships(scope: &StaleScope, tag: i64, limit: u64) -> Statement {
    let query = format!(
        "MATCH {pattern} \
         WHERE r.lastupdated <> $update_tag AND n.lastupdated = $update_tag \
         WITH r LIMIT $limit DELETE r",
        pattern = path_pattern(scope),
    );
    Statement {
        query,
        parameters: sweep_parameters(scope, tag, limit),
    }
}

fn render_stale_nodes(scope: &StaleScope, tag: i64, limit: u64) -> Statement {
    let query = format!(
        "MATCH {pattern} \
         WHERE n.lastupdated <> $update_tag \
         WITH n LIMIT $limit DETACH DELETE n",
        pattern = path_pattern(scope),
    );
    Statement {
        query,
        parameters: sweep_parameters(scope, tag, limit),
    }
}

fn sweep_parameters(
    scope: &StaleScope,
    tag: i64,
    limit: u64,
) -> BTreeMap<String, Value> {
    let mut parameters = BTreeMap::new();
    parameters.insert("anchor_key".to_string(), json!(scope.anchor.key));
    parameters.insert("update_tag".to_string(), json!(tag));
    parameters.insert("limit".to_string(), json!(limit));
    parameters
}

/// Pattern from the anchor to the terminal node `n`, binding the final
/// relationship as `r`. Intermediate hops stay anonymous.
fn path_pattern(scope: &StaleScope) -> String {
    let mut pattern = format!(
        "(:{label}{{{key_property}: $anchor_key}})",
        label = scope.anchor.label,
        key_property = scope.anchor.key_property,
    );
    let hop_count = scope.hops.len();
    for (index, hop) in scope.hops.iter().enumerate() {
        let last = index + 1 == hop_count;
        let rel_binding = if last { "r" } else { "" };
        let node = if last {
            format!("(n:{})", hop.label)
        } else {
            format!("(:{})", hop.label)
        };
        let segment = match hop.direction {
            RelDirection::Outgoing => {
                format!("-[{rel_binding}:{}]->{node}", hop.rel_type)
            }
            RelDirection::Incoming => {
                format!("<-[{rel_binding}:{}]-{node}", hop.rel_type)
            }
        };
        pattern.push_str(&segment);
    }
    pattern
}

fn props_value(props: &BTreeMap<String, atlas_model::PropertyValue>) -> Value {
    Value::Object(
        props
            .iter()
            .map(|(key, value)| {
                (
                    key.clone(),
                    serde_json::to_value(value).unwrap_or(Value::Null),
                )
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use atlas_model::{NodeRef, PropertyValue, UpdateTag};

    use super::*;
    use crate::graph::op::Hop;

    #[test]
    fn merge_node_statement_stamps_both_tags() {
        let mut properties = BTreeMap::new();
        properties.insert("region".to_string(), PropertyValue::from("us-east-1"));
        let statement = render(&GraphOp::MergeNode(MergeNode {
            node: NodeRef::with_id("EC2Instance", "i-01"),
            properties,
            tag: UpdateTag(123456789),
        }));

        assert_eq!(
            statement.query,
            "MERGE (n:EC2Instance{id: $key}) \
             ON CREATE SET n.firstseen = $update_tag \
             SET n += $props, n.lastupdated = $update_tag"
        );
        assert_eq!(statement.parameters["key"], json!("i-01"));
        assert_eq!(statement.parameters["update_tag"], json!(123456789));
        assert_eq!(
            statement.parameters["props"],
            json!({"region": "us-east-1"})
        );
    }

    #[test]
    fn merge_relationship_matches_both_endpoints_first() {
        let statement = render(&GraphOp::MergeRelationship(MergeRelationship {
            start: NodeRef::with_id("AWSAccount", "000000000000"),
            rel_type: "RESOURCE".to_string(),
            end: NodeRef::new("EC2Instance", "arn", "arn:aws:ec2:i-01"),
            properties: BTreeMap::new(),
            tag: UpdateTag(42),
        }));

        assert!(statement.query.starts_with(
            "MATCH (a:AWSAccount{id: $start_key}) MATCH (b:EC2Instance{arn: $end_key}) MERGE (a)-[r:RESOURCE]->(b)"
        ));
        assert_eq!(statement.parameters["start_key"], json!("000000000000"));
    }

    #[test]
    fn stale_node_sweep_is_anchor_joined_and_limited() {
        let statement = render(&GraphOp::DeleteStaleNodes {
            scope: StaleScope {
                anchor: NodeRef::with_id("AWSAccount", "000000000000"),
                hops: vec![Hop::incoming("RESOURCE", "EC2Instance")],
            },
            tag: UpdateTag(200),
            limit: 100,
        });

        assert_eq!(
            statement.query,
            "MATCH (:AWSAccount{id: $anchor_key})<-[r:RESOURCE]-(n:EC2Instance) \
             WHERE n.lastupdated <> $update_tag \
             WITH n LIMIT $limit DETACH DELETE n"
        );
        assert_eq!(statement.parameters["anchor_key"], json!("000000000000"));
        assert_eq!(statement.parameters["limit"], json!(100));
    }

    #[test]
    fn multi_hop_pattern_keeps_intermediate_hops_anonymous() {
        let statement = render(&GraphOp::DeleteStaleRelationships {
            scope: StaleScope {
                anchor: NodeRef::with_id("GCPProject", "p-1"),
                hops: vec![
                    Hop::outgoing("HAS_CLUSTER", "GKECluster"),
                    Hop::outgoing("HAS_NODEPOOL", "NodePool"),
                ],
            },
            tag: UpdateTag(7),
            limit: 50,
        });

        assert!(statement.query.contains(
            "(:GCPProject{id: $anchor_key})-[:HAS_CLUSTER]->(:GKECluster)-[r:HAS_NODEPOOL]->(n:NodePool)"
        ));
        assert!(
            statement
                .query
                .contains("WHERE r.lastupdated <> $update_tag AND n.lastupdated = $update_tag")
        );
    }
}
