use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::config::TopologyConfig;
use crate::error::TopologyError;
use crate::graph::{CopartitionMember, NodeSpec, TopologyBuilder};
use crate::types::{Millis, NodeId, StreamId};
use crate::window::{EmitStrategy, WindowKind};

/// How data is partitioned between upstream and downstream operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Partition {
    /// One-to-one, same partition on both sides.
    Forward,
    /// Hash-partition by key through an internal topic.
    Hash,
}

/// An internal topic that re-keys a stream before aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepartitionSpec {
    pub topic: String,
    pub sink_name: String,
    pub source_name: String,
    pub key_codec: String,
    pub value_codec: String,
    /// Partition count of the internal topic, when the co-partition group fixes it.
    pub partitions: Option<u32>,
}

/// A per-input aggregation processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSpec {
    pub window: WindowKind,
    pub store_name: String,
    /// `None` for rolling aggregations.
    pub grace_period_ms: Option<Millis>,
    pub retention_ms: Option<Millis>,
    pub emit: Option<EmitStrategy>,
    pub output_versioned: bool,
}

/// What a graph node does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Reads an external topic.
    Source {
        topic: String,
        partitions: Option<u32>,
    },
    /// Stateless record transformation.
    Processor,
    Repartition(RepartitionSpec),
    Aggregate(AggregateSpec),
    /// Pass-through combining the partial aggregates of a cogroup.
    Merge { store_name: String },
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Source { .. } => "Source",
            NodeKind::Processor => "Processor",
            NodeKind::Repartition(_) => "Repartition",
            NodeKind::Aggregate(_) => "Aggregate",
            NodeKind::Merge { .. } => "Merge",
        }
    }
}

/// A node in the topology DAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
}

/// An edge connecting two nodes in the DAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub partition: Partition,
}

/// Streams that must share a partition count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopartitionGroup {
    pub members: Vec<CopartitionMember>,
    pub partitions: Option<u32>,
}

/// Position in a [`StreamGraph`]'s history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphSavepoint {
    next_id: NodeId,
    edges: usize,
    copartition_groups: usize,
    name_index: u32,
}

/// The logical DAG representing the topology under construction.
#[derive(Debug, Default)]
pub struct StreamGraph {
    config: TopologyConfig,
    nodes: BTreeMap<NodeId, StreamNode>,
    edges: Vec<StreamEdge>,
    names: AHashSet<String>,
    copartition_groups: Vec<CopartitionGroup>,
    next_id: NodeId,
    next_stream_id: StreamId,
    name_index: u32,
}

impl StreamGraph {
    /// Create an empty graph with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TopologyConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Allocate a handle for a new grouped stream.
    pub fn new_stream_id(&mut self) -> StreamId {
        let id = self.next_stream_id;
        self.next_stream_id += 1;
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&StreamNode> {
        self.nodes.get(&id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&StreamNode> {
        self.nodes.values().find(|n| n.name == name)
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &StreamNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[StreamEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn copartition_groups(&self) -> &[CopartitionGroup] {
        &self.copartition_groups
    }

    /// Get downstream node IDs for a given node.
    pub fn downstream(&self, node_id: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.source == node_id)
            .map(|e| e.target)
            .collect()
    }

    /// Get upstream node IDs for a given node.
    pub fn upstream(&self, node_id: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.target == node_id)
            .map(|e| e.source)
            .collect()
    }

    /// Find all source nodes (no upstream edges).
    pub fn sources(&self) -> Vec<NodeId> {
        self.nodes
            .keys()
            .copied()
            .filter(|id| self.upstream(*id).is_empty())
            .collect()
    }

    fn next_index(&mut self) -> u32 {
        let index = self.name_index;
        self.name_index += 1;
        index
    }
}

impl TopologyBuilder for StreamGraph {
    type Savepoint = GraphSavepoint;

    fn config(&self) -> &TopologyConfig {
        &self.config
    }

    fn add_node(&mut self, parents: &[NodeId], node: NodeSpec) -> Result<NodeId, TopologyError> {
        if let Some(missing) = parents.iter().find(|p| !self.nodes.contains_key(*p)) {
            return Err(TopologyError::UnknownNode(*missing));
        }
        if self.names.contains(&node.name) {
            return Err(TopologyError::DuplicateNodeName(node.name));
        }

        let id = self.next_id;
        self.next_id += 1;
        for &parent in parents {
            // Records cross an internal topic when leaving a repartition node.
            let partition = match self.nodes[&parent].kind {
                NodeKind::Repartition(_) => Partition::Hash,
                _ => Partition::Forward,
            };
            self.edges.push(StreamEdge {
                source: parent,
                target: id,
                partition,
            });
        }
        tracing::debug!(
            "added {} node {} `{}` under {:?}",
            node.kind.label(),
            id,
            node.name,
            parents
        );
        self.names.insert(node.name.clone());
        self.nodes.insert(
            id,
            StreamNode {
                id,
                name: node.name,
                kind: node.kind,
            },
        );
        Ok(id)
    }

    fn node_name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.name.as_str())
    }

    fn new_processor_name(&mut self, prefix: &str) -> String {
        format!("{prefix}{:010}", self.next_index())
    }

    fn new_store_name(&mut self, prefix: &str) -> String {
        format!("{prefix}STATE-STORE-{:010}", self.next_index())
    }

    fn ensure_copartition(
        &mut self,
        reference: &CopartitionMember,
        peers: &[CopartitionMember],
    ) -> Result<Option<u32>, TopologyError> {
        let members: Vec<CopartitionMember> =
            std::iter::once(reference).chain(peers).cloned().collect();

        let fixed: Vec<(&str, u32)> = members
            .iter()
            .filter(|m| !m.repartitioned)
            .filter_map(|m| m.partitions.map(|p| (m.topic.as_str(), p)))
            .collect();
        let counts: BTreeSet<u32> = fixed.iter().map(|(_, p)| *p).collect();
        if counts.len() > 1 {
            return Err(TopologyError::CopartitionViolation {
                topics: fixed.iter().map(|(t, _)| t.to_string()).collect(),
                partitions: fixed.iter().map(|(_, p)| *p).collect(),
            });
        }

        let partitions = counts.into_iter().next();
        tracing::debug!(
            "co-partition group of {} streams resolved to {:?} partitions",
            members.len(),
            partitions
        );
        self.copartition_groups.push(CopartitionGroup {
            members,
            partitions,
        });
        Ok(partitions)
    }

    fn savepoint(&self) -> GraphSavepoint {
        GraphSavepoint {
            next_id: self.next_id,
            edges: self.edges.len(),
            copartition_groups: self.copartition_groups.len(),
            name_index: self.name_index,
        }
    }

    fn rollback(&mut self, savepoint: GraphSavepoint) {
        let dropped = self.nodes.split_off(&savepoint.next_id);
        for node in dropped.into_values() {
            self.names.remove(&node.name);
        }
        self.edges.truncate(savepoint.edges);
        self.copartition_groups
            .truncate(savepoint.copartition_groups);
        self.next_id = savepoint.next_id;
        self.name_index = savepoint.name_index;
    }
}

#[cfg(test)]
#[path = "tests/stream_graph_tests.rs"]
mod tests;
