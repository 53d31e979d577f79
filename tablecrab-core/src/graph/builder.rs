use serde::{Deserialize, Serialize};

use crate::config::TopologyConfig;
use crate::error::TopologyError;
use crate::graph::NodeKind;
use crate::types::{NodeId, StreamId};

/// A node to be registered: its unique name and what it does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    pub name: String,
    pub kind: NodeKind,
}

impl NodeSpec {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// One stream taking part in a co-partition requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopartitionMember {
    pub stream: StreamId,
    /// Topic the aggregation reads this stream from.
    pub topic: String,
    /// Partition count of `topic`, when fixed.
    pub partitions: Option<u32>,
    /// Internal repartition topics adopt the partition count of their group.
    pub repartitioned: bool,
}

/// The topology assembly surface consumed by the cogroup planner.
///
/// Implementations are single-writer: the whole topology is assembled from
/// one thread before it is frozen.
pub trait TopologyBuilder {
    /// Marker of a past graph state a failed build can return to.
    type Savepoint;

    /// Topology-wide settings.
    fn config(&self) -> &TopologyConfig;

    /// Register `node` as a child of every node in `parents`.
    fn add_node(&mut self, parents: &[NodeId], node: NodeSpec) -> Result<NodeId, TopologyError>;

    /// Name of a registered node.
    fn node_name(&self, id: NodeId) -> Option<&str>;

    /// Generate a unique processor name: `<prefix><10-digit index>`.
    fn new_processor_name(&mut self, prefix: &str) -> String;

    /// Generate a unique state store name: `<prefix>STATE-STORE-<10-digit index>`.
    fn new_store_name(&mut self, prefix: &str) -> String;

    /// Record that `reference` and every stream in `peers` must be co-partitioned.
    ///
    /// Returns the partition count the group resolves to when at least one
    /// member has a fixed count.
    fn ensure_copartition(
        &mut self,
        reference: &CopartitionMember,
        peers: &[CopartitionMember],
    ) -> Result<Option<u32>, TopologyError>;

    fn savepoint(&self) -> Self::Savepoint;

    /// Drop everything registered after `savepoint` was taken.
    fn rollback(&mut self, savepoint: Self::Savepoint);
}
