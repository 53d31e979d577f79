use std::cell::RefCell;
use std::rc::Rc;

use tablecrab_core::cogroup::{CogroupEntry, CogroupRequest, Initializer, Merger, build_cogroup};
use tablecrab_core::error::TopologyError;
use tablecrab_core::graph::{Named, TopologyBuilder};
use tablecrab_core::types::StreamData;
use tablecrab_core::window::{WindowKind, WindowSpec};

use crate::datastream::KGroupedStream;
use crate::environment::EnvInner;
use crate::materialized::Materialized;
use crate::table::KTable;

/// Several grouped streams that aggregate into one table of `VA`.
///
/// Created by [`KGroupedStream::cogroup`]; add more inputs with
/// [`cogroup`](Self::cogroup).
pub struct CogroupedKStream<K, VA> {
    pub(crate) env: Rc<RefCell<EnvInner>>,
    pub(crate) entries: Vec<CogroupEntry<K, VA>>,
}

impl<K, VA> CogroupedKStream<K, VA>
where
    K: StreamData,
    VA: StreamData,
{
    /// Add `grouped` as another input, folded into the aggregate by `aggregator`.
    pub fn cogroup<V, F>(mut self, grouped: &KGroupedStream<K, V>, aggregator: F) -> Self
    where
        V: StreamData,
        F: Fn(&K, &V, VA) -> VA + Send + Sync + 'static,
    {
        self.entries.push(grouped.entry(aggregator));
        self
    }

    /// Aggregate over all time into a store with a generated name.
    pub fn aggregate<I>(self, initializer: I) -> Result<KTable<K, VA>, TopologyError>
    where
        I: Fn() -> VA + Send + Sync + 'static,
    {
        self.aggregate_with(initializer, Named::unnamed(), Materialized::new())
    }

    pub fn aggregate_with<I>(
        self,
        initializer: I,
        named: Named,
        materialized: Materialized,
    ) -> Result<KTable<K, VA>, TopologyError>
    where
        I: Fn() -> VA + Send + Sync + 'static,
    {
        build(
            self.env,
            self.entries,
            Initializer::new(initializer),
            WindowSpec::None,
            None,
            named,
            materialized,
        )
    }

    /// Aggregate per fixed or sliding window.
    pub fn windowed_by(self, window: WindowSpec) -> Result<TimeWindowedCogroupedKStream<K, VA>, TopologyError> {
        match window.kind() {
            WindowKind::Fixed | WindowKind::Sliding => Ok(TimeWindowedCogroupedKStream {
                inner: self,
                window,
            }),
            kind => Err(TopologyError::InvalidWindow(format!(
                "windowed_by takes fixed or sliding windows, got {kind}"
            ))),
        }
    }

    /// Aggregate per session.
    pub fn session_windowed_by(
        self,
        window: WindowSpec,
    ) -> Result<SessionWindowedCogroupedKStream<K, VA>, TopologyError> {
        match window.kind() {
            WindowKind::Session => Ok(SessionWindowedCogroupedKStream {
                inner: self,
                window,
            }),
            kind => Err(TopologyError::InvalidWindow(format!(
                "session_windowed_by takes session windows, got {kind}"
            ))),
        }
    }
}

/// A cogroup aggregated per fixed or sliding window.
pub struct TimeWindowedCogroupedKStream<K, VA> {
    inner: CogroupedKStream<K, VA>,
    window: WindowSpec,
}

impl<K, VA> TimeWindowedCogroupedKStream<K, VA>
where
    K: StreamData,
    VA: StreamData,
{
    pub fn aggregate<I>(self, initializer: I) -> Result<KTable<K, VA>, TopologyError>
    where
        I: Fn() -> VA + Send + Sync + 'static,
    {
        self.aggregate_with(initializer, Named::unnamed(), Materialized::new())
    }

    pub fn aggregate_with<I>(
        self,
        initializer: I,
        named: Named,
        materialized: Materialized,
    ) -> Result<KTable<K, VA>, TopologyError>
    where
        I: Fn() -> VA + Send + Sync + 'static,
    {
        build(
            self.inner.env,
            self.inner.entries,
            Initializer::new(initializer),
            self.window,
            None,
            named,
            materialized,
        )
    }
}

/// A cogroup aggregated per session.
pub struct SessionWindowedCogroupedKStream<K, VA> {
    inner: CogroupedKStream<K, VA>,
    window: WindowSpec,
}

impl<K, VA> SessionWindowedCogroupedKStream<K, VA>
where
    K: StreamData,
    VA: StreamData,
{
    /// `merger` combines the aggregates of two sessions that grew together.
    pub fn aggregate<I, M>(self, initializer: I, merger: M) -> Result<KTable<K, VA>, TopologyError>
    where
        I: Fn() -> VA + Send + Sync + 'static,
        M: Fn(&K, VA, VA) -> VA + Send + Sync + 'static,
    {
        self.aggregate_with(initializer, merger, Named::unnamed(), Materialized::new())
    }

    pub fn aggregate_with<I, M>(
        self,
        initializer: I,
        merger: M,
        named: Named,
        materialized: Materialized,
    ) -> Result<KTable<K, VA>, TopologyError>
    where
        I: Fn() -> VA + Send + Sync + 'static,
        M: Fn(&K, VA, VA) -> VA + Send + Sync + 'static,
    {
        build(
            self.inner.env,
            self.inner.entries,
            Initializer::new(initializer),
            self.window,
            Some(Merger::new(merger)),
            named,
            materialized,
        )
    }
}

fn build<K, VA>(
    env: Rc<RefCell<EnvInner>>,
    entries: Vec<CogroupEntry<K, VA>>,
    initializer: Initializer<VA>,
    window: WindowSpec,
    session_merger: Option<Merger<K, VA>>,
    named: Named,
    materialized: Materialized,
) -> Result<KTable<K, VA>, TopologyError> {
    let table = {
        let mut inner = env.borrow_mut();
        let graph = &mut inner.graph;
        // Taken before the store name is allocated so a rejected build
        // returns the name as well.
        let savepoint = graph.savepoint();
        let store = materialized.store(graph)?;
        let request = CogroupRequest {
            entries,
            initializer,
            window,
            store,
            named,
            session_merger,
            output_versioned: materialized.is_versioned(),
            codecs: materialized.codecs(),
        };
        match build_cogroup(graph, request) {
            Ok(table) => table,
            Err(e) => {
                graph.rollback(savepoint);
                return Err(e);
            }
        }
    };
    Ok(KTable::new(env, table))
}
