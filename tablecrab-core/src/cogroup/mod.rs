//! # Cogroup
//!
//! Turns several grouped streams, each with its own aggregator, into one
//! table: the inputs are co-partitioned ([`planner`]), aggregated one node per
//! input ([`aggregate`]) and joined under a single merge node ([`merge`]).

pub mod aggregate;
pub mod functions;
pub mod input;
pub mod merge;
pub mod planner;

pub use aggregate::*;
pub use functions::*;
pub use input::*;
pub use merge::*;
pub use planner::*;

use crate::error::TopologyError;
use crate::graph::{Named, TopologyBuilder};
use crate::store::StoreDescriptor;
use crate::window::{WindowKind, WindowSpec};

/// Everything one cogroup build needs.
#[derive(Debug, Clone)]
pub struct CogroupRequest<K, VA> {
    /// Inputs in registration order; the same stream may appear more than once.
    pub entries: Vec<CogroupEntry<K, VA>>,
    pub initializer: Initializer<VA>,
    pub window: WindowSpec,
    pub store: StoreDescriptor,
    pub named: Named,
    /// Required for session windows.
    pub session_merger: Option<Merger<K, VA>>,
    /// Only honoured for rolling aggregations.
    pub output_versioned: bool,
    pub codecs: TableCodecs,
}

/// Build the cogroup described by `request` into `builder`.
///
/// Either the whole cogroup is registered or, on error, the builder is
/// rolled back to where it was before the call.
pub fn build_cogroup<B, K, VA>(
    builder: &mut B,
    request: CogroupRequest<K, VA>,
) -> Result<CogroupedTable<K, VA>, TopologyError>
where
    B: TopologyBuilder + ?Sized,
{
    let savepoint = builder.savepoint();
    match assemble(builder, request) {
        Ok(table) => {
            tracing::info!(
                "built cogroup `{}` over store `{}`",
                table.name(),
                table.merge_processor().store_name()
            );
            Ok(table)
        }
        Err(e) => {
            tracing::warn!("cogroup build rejected, rolling back: {}", e);
            builder.rollback(savepoint);
            Err(e)
        }
    }
}

fn assemble<B, K, VA>(
    builder: &mut B,
    request: CogroupRequest<K, VA>,
) -> Result<CogroupedTable<K, VA>, TopologyError>
where
    B: TopologyBuilder + ?Sized,
{
    let CogroupRequest {
        entries,
        initializer,
        window,
        store,
        named,
        session_merger,
        output_versioned,
        codecs,
    } = request;

    let kind = window.kind();
    if store.is_versioned() && kind != WindowKind::None {
        return Err(TopologyError::VersionedWindowStore {
            store: store.store_name().to_string(),
            kind,
        });
    }

    let streams: Vec<&GroupedStream> = entries.iter().map(|e| &e.stream).collect();
    let parents = plan_repartitions(
        builder,
        &streams,
        store.store_name(),
        store.queryable_name(),
    )?;

    let factory = AggregateNodeFactory {
        named: &named,
        initializer: &initializer,
        store: &store,
        window: &window,
        session_merger: session_merger.as_ref(),
        output_versioned,
    };
    let aggregates = entries
        .into_iter()
        .zip(parents)
        .enumerate()
        .map(|(index, (entry, parent))| factory.build(builder, parent, index, entry.aggregator))
        .collect::<Result<Vec<_>, _>>()?;

    build_merge(builder, &named, &store, aggregates, codecs)
}

#[cfg(test)]
#[path = "tests/cogroup_tests.rs"]
mod tests;
