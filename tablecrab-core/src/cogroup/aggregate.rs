//! # Aggregate Node Factory
//!
//! Builds the per-input aggregation node of a cogroup. The [`WindowSpec`]
//! selects the processor variant and the grace period attached to the node.

use anyhow::Result;

use crate::cogroup::{Aggregator, Initializer, Merger};
use crate::error::TopologyError;
use crate::graph::{AggregateSpec, NodeKind, NodeSpec, Named, TopologyBuilder};
use crate::store::StoreDescriptor;
use crate::types::{BoxedValue, Millis, NodeId};
use crate::window::{EmitStrategy, WindowKind, WindowSpec};

/// Processor name prefix used when the cogroup has no scope name.
pub const AGGREGATE_NAME: &str = "COGROUPKSTREAM-AGGREGATE-";

/// The aggregation logic of one cogroup input.
///
/// Holds only shared, immutable functions, so every partition can clone it
/// and run its copy independently.
#[derive(Debug)]
pub enum AggregateProcessor<K, VA> {
    Rolling {
        store: StoreDescriptor,
        initializer: Initializer<VA>,
        aggregator: Aggregator<K, VA>,
    },
    TimeWindowed {
        size_ms: Millis,
        advance_ms: Millis,
        grace_period_ms: Millis,
        store: StoreDescriptor,
        initializer: Initializer<VA>,
        aggregator: Aggregator<K, VA>,
    },
    SessionWindowed {
        inactivity_gap_ms: Millis,
        grace_period_ms: Millis,
        store: StoreDescriptor,
        initializer: Initializer<VA>,
        aggregator: Aggregator<K, VA>,
        merger: Merger<K, VA>,
    },
    SlidingWindowed {
        time_difference_ms: Millis,
        grace_period_ms: Millis,
        store: StoreDescriptor,
        initializer: Initializer<VA>,
        aggregator: Aggregator<K, VA>,
    },
}

impl<K, VA> Clone for AggregateProcessor<K, VA> {
    fn clone(&self) -> Self {
        match self {
            AggregateProcessor::Rolling {
                store,
                initializer,
                aggregator,
            } => AggregateProcessor::Rolling {
                store: store.clone(),
                initializer: initializer.clone(),
                aggregator: aggregator.clone(),
            },
            AggregateProcessor::TimeWindowed {
                size_ms,
                advance_ms,
                grace_period_ms,
                store,
                initializer,
                aggregator,
            } => AggregateProcessor::TimeWindowed {
                size_ms: *size_ms,
                advance_ms: *advance_ms,
                grace_period_ms: *grace_period_ms,
                store: store.clone(),
                initializer: initializer.clone(),
                aggregator: aggregator.clone(),
            },
            AggregateProcessor::SessionWindowed {
                inactivity_gap_ms,
                grace_period_ms,
                store,
                initializer,
                aggregator,
                merger,
            } => AggregateProcessor::SessionWindowed {
                inactivity_gap_ms: *inactivity_gap_ms,
                grace_period_ms: *grace_period_ms,
                store: store.clone(),
                initializer: initializer.clone(),
                aggregator: aggregator.clone(),
                merger: merger.clone(),
            },
            AggregateProcessor::SlidingWindowed {
                time_difference_ms,
                grace_period_ms,
                store,
                initializer,
                aggregator,
            } => AggregateProcessor::SlidingWindowed {
                time_difference_ms: *time_difference_ms,
                grace_period_ms: *grace_period_ms,
                store: store.clone(),
                initializer: initializer.clone(),
                aggregator: aggregator.clone(),
            },
        }
    }
}

impl<K, VA> AggregateProcessor<K, VA> {
    /// Pick the processor variant for `window`.
    pub fn for_window(
        window: &WindowSpec,
        store: StoreDescriptor,
        initializer: Initializer<VA>,
        aggregator: Aggregator<K, VA>,
        session_merger: Option<&Merger<K, VA>>,
    ) -> Result<Self, TopologyError> {
        let processor = match *window {
            WindowSpec::None => AggregateProcessor::Rolling {
                store,
                initializer,
                aggregator,
            },
            WindowSpec::Fixed {
                size_ms,
                advance_ms,
                grace_period_ms,
            } => AggregateProcessor::TimeWindowed {
                size_ms,
                advance_ms,
                grace_period_ms,
                store,
                initializer,
                aggregator,
            },
            WindowSpec::Session {
                grace_period_ms,
                inactivity_gap_ms,
            } => AggregateProcessor::SessionWindowed {
                inactivity_gap_ms,
                grace_period_ms,
                store,
                initializer,
                aggregator,
                merger: session_merger
                    .cloned()
                    .ok_or(TopologyError::MissingSessionMerger)?,
            },
            WindowSpec::Sliding {
                time_difference_ms,
                grace_period_ms,
            } => AggregateProcessor::SlidingWindowed {
                time_difference_ms,
                grace_period_ms,
                store,
                initializer,
                aggregator,
            },
        };
        Ok(processor)
    }

    pub fn kind(&self) -> WindowKind {
        match self {
            AggregateProcessor::Rolling { .. } => WindowKind::None,
            AggregateProcessor::TimeWindowed { .. } => WindowKind::Fixed,
            AggregateProcessor::SessionWindowed { .. } => WindowKind::Session,
            AggregateProcessor::SlidingWindowed { .. } => WindowKind::Sliding,
        }
    }

    /// Grace period of the node this processor runs in; `None` when rolling.
    pub fn grace_period_ms(&self) -> Option<Millis> {
        match self {
            AggregateProcessor::Rolling { .. } => None,
            AggregateProcessor::TimeWindowed {
                grace_period_ms, ..
            }
            | AggregateProcessor::SlidingWindowed {
                grace_period_ms, ..
            } => Some(*grace_period_ms),
            AggregateProcessor::SessionWindowed {
                inactivity_gap_ms,
                grace_period_ms,
                ..
            } => Some(grace_period_ms.saturating_add(*inactivity_gap_ms)),
        }
    }

    /// Windowed cogroup aggregates always emit on window update.
    pub fn emit_strategy(&self) -> Option<EmitStrategy> {
        match self {
            AggregateProcessor::Rolling { .. } => None,
            _ => Some(EmitStrategy::OnWindowUpdate),
        }
    }

    pub fn store(&self) -> &StoreDescriptor {
        match self {
            AggregateProcessor::Rolling { store, .. }
            | AggregateProcessor::TimeWindowed { store, .. }
            | AggregateProcessor::SessionWindowed { store, .. }
            | AggregateProcessor::SlidingWindowed { store, .. } => store,
        }
    }

    pub fn initializer(&self) -> &Initializer<VA> {
        match self {
            AggregateProcessor::Rolling { initializer, .. }
            | AggregateProcessor::TimeWindowed { initializer, .. }
            | AggregateProcessor::SessionWindowed { initializer, .. }
            | AggregateProcessor::SlidingWindowed { initializer, .. } => initializer,
        }
    }

    pub fn aggregator(&self) -> &Aggregator<K, VA> {
        match self {
            AggregateProcessor::Rolling { aggregator, .. }
            | AggregateProcessor::TimeWindowed { aggregator, .. }
            | AggregateProcessor::SessionWindowed { aggregator, .. }
            | AggregateProcessor::SlidingWindowed { aggregator, .. } => aggregator,
        }
    }

    pub fn session_merger(&self) -> Option<&Merger<K, VA>> {
        match self {
            AggregateProcessor::SessionWindowed { merger, .. } => Some(merger),
            _ => None,
        }
    }

    /// Fold `value` into `current`, starting from the initializer for new keys.
    pub fn aggregate(&self, key: &K, value: &BoxedValue, current: Option<VA>) -> Result<VA> {
        let current = current.unwrap_or_else(|| self.initializer().apply());
        self.aggregator().apply(key, value, current)
    }
}

/// An aggregate node registered in the graph, with its processor.
#[derive(Debug, Clone)]
pub struct AggregateNode<K, VA> {
    pub node: NodeId,
    pub name: String,
    pub processor: AggregateProcessor<K, VA>,
}

/// Settings shared by every aggregate node of one cogroup.
pub struct AggregateNodeFactory<'a, K, VA> {
    pub named: &'a Named,
    pub initializer: &'a Initializer<VA>,
    pub store: &'a StoreDescriptor,
    pub window: &'a WindowSpec,
    pub session_merger: Option<&'a Merger<K, VA>>,
    /// Caller-supplied for rolling aggregations; windowed outputs are never versioned.
    pub output_versioned: bool,
}

impl<K, VA> AggregateNodeFactory<'_, K, VA> {
    /// Build the aggregate node of input number `index` under `parent`.
    pub fn build<B>(
        &self,
        builder: &mut B,
        parent: NodeId,
        index: usize,
        aggregator: Aggregator<K, VA>,
    ) -> Result<AggregateNode<K, VA>, TopologyError>
    where
        B: TopologyBuilder + ?Sized,
    {
        let processor = AggregateProcessor::for_window(
            self.window,
            self.store.clone(),
            self.initializer.clone(),
            aggregator,
            self.session_merger,
        )?;
        let retention_ms = self.store.effective_retention_ms(self.window)?;

        let name = self.named.suffix_with_or_else_get(
            &format!("-cogroup-agg-{index}"),
            builder,
            AGGREGATE_NAME,
        );
        let spec = AggregateSpec {
            window: processor.kind(),
            store_name: self.store.store_name().to_string(),
            grace_period_ms: self.window.effective_grace_ms(),
            retention_ms,
            emit: self.window.cogroup_emit_strategy(),
            output_versioned: processor.kind() == WindowKind::None && self.output_versioned,
        };
        let node = builder.add_node(&[parent], NodeSpec::new(name.clone(), NodeKind::Aggregate(spec)))?;

        Ok(AggregateNode {
            node,
            name,
            processor,
        })
    }
}

#[cfg(test)]
#[path = "tests/aggregate_tests.rs"]
mod tests;
