//! # Repartition Planner
//!
//! Resolves, for every cogroup input, the node its aggregation attaches to.
//! Re-keyed inputs get a repartition topic, created once per distinct
//! stream, and all inputs are registered as one co-partition group.
//!
//! Planning happens in two phases: names, topics and co-partition members are
//! worked out first, and repartition nodes are only added to the graph once
//! the co-partition requirement was accepted.

use ahash::AHashMap;

use crate::cogroup::GroupedStream;
use crate::error::TopologyError;
use crate::graph::{CopartitionMember, NodeKind, NodeSpec, RepartitionSpec, TopologyBuilder};
use crate::types::{NodeId, StreamId};

const REPARTITION_TOPIC_SUFFIX: &str = "-repartition";
const FILTER_NAME: &str = "KSTREAM-FILTER-";
const SINK_NAME: &str = "KSTREAM-SINK-";
const SOURCE_NAME: &str = "KSTREAM-SOURCE-";

/// A repartition topic waiting to be committed to the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingRepartition {
    parent: NodeId,
    filter_name: String,
    spec: RepartitionSpec,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Existing(NodeId),
    Pending(usize),
}

/// The repartition topic for `prefix`, unless `prefix` already names one.
pub fn repartition_topic(prefix: &str) -> String {
    if prefix.ends_with(REPARTITION_TOPIC_SUFFIX) {
        prefix.to_string()
    } else {
        format!("{prefix}{REPARTITION_TOPIC_SUFFIX}")
    }
}

fn plan_repartition<B>(
    builder: &mut B,
    stream: &GroupedStream,
    store_name: &str,
    queryable_name: Option<&str>,
) -> Result<PendingRepartition, TopologyError>
where
    B: TopologyBuilder + ?Sized,
{
    let prefix = stream.repartition_name().unwrap_or(store_name);
    let topic = repartition_topic(prefix);
    // A queryable store name was chosen by the user as well, so deriving the
    // internal names from it keeps them stable.
    let provided_by_user = stream.repartition_name().is_some() || queryable_name.is_some();

    let (filter_name, sink_name, source_name) = if provided_by_user {
        (
            format!("{prefix}-repartition-filter"),
            format!("{prefix}-repartition-sink"),
            format!("{prefix}-repartition-source"),
        )
    } else {
        if builder.config().ensure_explicit_internal_naming {
            return Err(TopologyError::ImplicitInternalName { resource: topic });
        }
        (
            builder.new_processor_name(FILTER_NAME),
            builder.new_processor_name(SINK_NAME),
            builder.new_processor_name(SOURCE_NAME),
        )
    };

    let config = builder.config();
    let spec = RepartitionSpec {
        topic,
        sink_name,
        source_name,
        key_codec: config.key_codec_or_default(stream.key_codec()),
        value_codec: config.value_codec_or_default(stream.value_codec()),
        partitions: None,
    };
    Ok(PendingRepartition {
        parent: stream.node(),
        filter_name,
        spec,
    })
}

/// Resolve the parent node of every input, in input order.
///
/// A stream that appears in several inputs is repartitioned once and every
/// input referencing it attaches to the same repartition node.
pub fn plan_repartitions<B>(
    builder: &mut B,
    inputs: &[&GroupedStream],
    store_name: &str,
    queryable_name: Option<&str>,
) -> Result<Vec<NodeId>, TopologyError>
where
    B: TopologyBuilder + ?Sized,
{
    if inputs.is_empty() {
        return Err(TopologyError::EmptyCogroup);
    }

    let mut resolved: AHashMap<StreamId, Slot> = AHashMap::new();
    let mut pending: Vec<PendingRepartition> = Vec::new();
    let mut members: Vec<CopartitionMember> = Vec::new();
    let mut slots: Vec<Slot> = Vec::with_capacity(inputs.len());

    for stream in inputs {
        if let Some(slot) = resolved.get(&stream.id()) {
            tracing::debug!("stream {} already resolved, reusing its parent", stream.id());
            slots.push(*slot);
            continue;
        }

        let slot = if stream.repartition_required() {
            let repartition = plan_repartition(builder, stream, store_name, queryable_name)?;
            members.push(CopartitionMember {
                stream: stream.id(),
                topic: repartition.spec.topic.clone(),
                partitions: None,
                repartitioned: true,
            });
            pending.push(repartition);
            Slot::Pending(pending.len() - 1)
        } else {
            members.push(stream.source_member());
            Slot::Existing(stream.node())
        };
        resolved.insert(stream.id(), slot);
        slots.push(slot);
    }

    let (reference, peers) = members
        .split_first()
        .ok_or(TopologyError::EmptyCogroup)?;
    let partitions = builder.ensure_copartition(reference, peers)?;

    let mut committed = Vec::with_capacity(pending.len());
    for mut repartition in pending {
        repartition.spec.partitions = partitions;
        tracing::debug!(
            "repartitioning through `{}` ({:?} partitions)",
            repartition.spec.topic,
            partitions
        );
        let id = builder.add_node(
            &[repartition.parent],
            NodeSpec::new(repartition.filter_name, NodeKind::Repartition(repartition.spec)),
        )?;
        committed.push(id);
    }

    Ok(slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Existing(node) => node,
            Slot::Pending(index) => committed[index],
        })
        .collect())
}

#[cfg(test)]
#[path = "tests/planner_tests.rs"]
mod tests;
