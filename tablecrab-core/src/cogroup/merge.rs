//! # Merge Node Builder
//!
//! Joins the aggregate nodes of one cogroup under a single pass-through node
//! and wraps the result as a table handle.

use std::collections::BTreeSet;

use crate::cogroup::{AggregateNode, AggregateProcessor};
use crate::error::TopologyError;
use crate::graph::{NodeKind, NodeSpec, Named, TopologyBuilder};
use crate::store::StoreDescriptor;
use crate::types::NodeId;

/// Processor name prefix used when the cogroup has no scope name.
pub const MERGE_NAME: &str = "COGROUPKSTREAM-MERGE-";

/// Forwards whatever any of its aggregate parents emits.
///
/// Keeps the parent processors so that reads against the shared store can be
/// answered through any of them.
#[derive(Debug, Clone)]
pub struct MergeProcessor<K, VA> {
    store_name: String,
    processors: Vec<AggregateProcessor<K, VA>>,
}

impl<K, VA> MergeProcessor<K, VA> {
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn processors(&self) -> &[AggregateProcessor<K, VA>] {
        &self.processors
    }

    /// Forward `record` unchanged.
    pub fn process<T>(&self, record: T) -> T {
        record
    }
}

/// The table produced by a cogroup.
#[derive(Debug, Clone)]
pub struct CogroupedTable<K, VA> {
    name: String,
    node: NodeId,
    /// Nodes the table is read from: only the merge node.
    node_names: BTreeSet<String>,
    queryable_name: Option<String>,
    key_codec: Option<String>,
    value_codec: Option<String>,
    merge: MergeProcessor<K, VA>,
}

impl<K, VA> CogroupedTable<K, VA> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Graph node of the merge processor.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn node_names(&self) -> &BTreeSet<String> {
        &self.node_names
    }

    pub fn queryable_name(&self) -> Option<&str> {
        self.queryable_name.as_deref()
    }

    pub fn key_codec(&self) -> Option<&str> {
        self.key_codec.as_deref()
    }

    pub fn value_codec(&self) -> Option<&str> {
        self.value_codec.as_deref()
    }

    pub fn merge_processor(&self) -> &MergeProcessor<K, VA> {
        &self.merge
    }
}

/// Codecs of the table's key and value, as codec ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableCodecs {
    pub key_codec: Option<String>,
    pub value_codec: Option<String>,
}

/// Add the merge node over `aggregates` and build the table handle.
pub fn build_merge<B, K, VA>(
    builder: &mut B,
    named: &Named,
    store: &StoreDescriptor,
    aggregates: Vec<AggregateNode<K, VA>>,
    codecs: TableCodecs,
) -> Result<CogroupedTable<K, VA>, TopologyError>
where
    B: TopologyBuilder + ?Sized,
{
    if aggregates.is_empty() {
        return Err(TopologyError::EmptyCogroup);
    }

    let name = named.suffix_with_or_else_get("-cogroup-merge", builder, MERGE_NAME);
    let parents: Vec<NodeId> = aggregates.iter().map(|a| a.node).collect();
    let node = builder.add_node(
        &parents,
        NodeSpec::new(
            name.clone(),
            NodeKind::Merge {
                store_name: store.store_name().to_string(),
            },
        ),
    )?;

    let processors = aggregates.into_iter().map(|a| a.processor).collect();
    tracing::debug!("merge node `{}` joins {} aggregates", name, parents.len());

    Ok(CogroupedTable {
        node_names: BTreeSet::from([name.clone()]),
        name,
        node,
        queryable_name: store.queryable_name().map(str::to_string),
        key_codec: codecs.key_codec,
        value_codec: codecs.value_codec,
        merge: MergeProcessor {
            store_name: store.store_name().to_string(),
            processors,
        },
    })
}

#[cfg(test)]
#[path = "tests/merge_tests.rs"]
mod tests;
