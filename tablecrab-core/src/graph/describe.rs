//! # Topology Description
//!
//! A stable, printable view of a [`StreamGraph`]. Two graphs assembled from
//! the same inputs in the same order describe identically, which keeps
//! generated names reviewable across rebuilds.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::graph::{NodeKind, StreamGraph, TopologyBuilder};
use crate::types::NodeId;

/// One node of a [`TopologyDescription`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescription {
    pub name: String,
    pub kind: NodeKind,
    pub predecessors: Vec<String>,
    pub successors: Vec<String>,
}

/// Serializable description of a whole topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyDescription {
    pub application_id: String,
    /// Nodes in topological order, ties broken by node id.
    pub nodes: Vec<NodeDescription>,
    /// Topic names of every co-partition group.
    pub copartition_groups: Vec<Vec<String>>,
}

impl TopologyDescription {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }

    pub fn node(&self, name: &str) -> Option<&NodeDescription> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

/// Topological sort of the graph (Kahn's algorithm, lowest id first).
pub fn topo_sort(graph: &StreamGraph) -> Vec<NodeId> {
    let mut in_degree: BTreeMap<NodeId, usize> = graph.nodes().map(|n| (n.id, 0)).collect();
    for edge in graph.edges() {
        *in_degree.entry(edge.target).or_insert(0) += 1;
    }

    let mut queue: BinaryHeap<Reverse<NodeId>> = in_degree
        .iter()
        .filter(|entry| *entry.1 == 0)
        .map(|entry| Reverse(*entry.0))
        .collect();

    let mut result = Vec::with_capacity(in_degree.len());
    while let Some(Reverse(node)) = queue.pop() {
        result.push(node);
        for next in graph.downstream(node) {
            if let Some(deg) = in_degree.get_mut(&next) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push(Reverse(next));
                }
            }
        }
    }
    result
}

impl StreamGraph {
    /// Describe the graph in a deterministic order.
    pub fn describe(&self) -> TopologyDescription {
        let names = |ids: Vec<NodeId>| -> Vec<String> {
            ids.into_iter()
                .filter_map(|id| self.node_name(id).map(str::to_string))
                .collect()
        };

        let nodes = topo_sort(self)
            .into_iter()
            .filter_map(|id| self.node(id))
            .map(|node| NodeDescription {
                name: node.name.clone(),
                kind: node.kind.clone(),
                predecessors: names(self.upstream(node.id)),
                successors: names(self.downstream(node.id)),
            })
            .collect();

        let copartition_groups = self
            .copartition_groups()
            .iter()
            .map(|g| g.members.iter().map(|m| m.topic.clone()).collect())
            .collect();

        TopologyDescription {
            application_id: self.config().application_id.clone(),
            nodes,
            copartition_groups,
        }
    }
}

fn kind_details(kind: &NodeKind) -> String {
    match kind {
        NodeKind::Source { topic, partitions } => match partitions {
            Some(p) => format!("topic: {topic}, partitions: {p}"),
            None => format!("topic: {topic}"),
        },
        NodeKind::Processor => String::new(),
        NodeKind::Repartition(spec) => format!(
            "topic: {}, sink: {}, source: {}",
            spec.topic, spec.sink_name, spec.source_name
        ),
        NodeKind::Aggregate(spec) => {
            let mut details = format!("{}, store: {}", spec.window, spec.store_name);
            if let Some(grace) = spec.grace_period_ms {
                details.push_str(&format!(", grace: {grace}ms"));
            }
            if spec.output_versioned {
                details.push_str(", versioned");
            }
            details
        }
        NodeKind::Merge { store_name } => format!("store: {store_name}"),
    }
}

impl std::fmt::Display for TopologyDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Topology: {}", self.application_id)?;
        for node in &self.nodes {
            let details = kind_details(&node.kind);
            if details.is_empty() {
                writeln!(f, "  {}: {}", node.kind.label(), node.name)?;
            } else {
                writeln!(f, "  {}: {} ({})", node.kind.label(), node.name, details)?;
            }
            if !node.predecessors.is_empty() {
                writeln!(f, "    <-- {}", node.predecessors.join(", "))?;
            }
            if !node.successors.is_empty() {
                writeln!(f, "    --> {}", node.successors.join(", "))?;
            }
        }
        for group in &self.copartition_groups {
            writeln!(f, "  Co-partitioned: [{}]", group.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/describe_tests.rs"]
mod tests;
