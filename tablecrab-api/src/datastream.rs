use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tablecrab_core::cogroup::{Aggregator, CogroupEntry, GroupedStream};
use tablecrab_core::error::TopologyError;
use tablecrab_core::graph::{NodeKind, NodeSpec, TopologyBuilder};
use tablecrab_core::types::{BoxedValue, NodeId, StreamData};

use crate::cogrouped::CogroupedKStream;
use crate::environment::EnvInner;
use crate::materialized::Grouped;

const KEY_SELECT_NAME: &str = "KSTREAM-KEY-SELECT-";
const MAP_VALUES_NAME: &str = "KSTREAM-MAPVALUES-";

type RecordFn = dyn Fn(&BoxedValue) -> Result<BoxedValue> + Send + Sync;

/// A registered stateless operator, kept for the runtime to instantiate.
///
/// Records are `(key, value)` tuples boxed as [`BoxedValue`].
#[derive(Clone)]
pub enum OperatorFactory {
    SelectKey { node_id: NodeId, apply: Arc<RecordFn> },
    MapValues { node_id: NodeId, apply: Arc<RecordFn> },
}

impl OperatorFactory {
    pub fn node_id(&self) -> NodeId {
        match self {
            OperatorFactory::SelectKey { node_id, .. } | OperatorFactory::MapValues { node_id, .. } => {
                *node_id
            }
        }
    }

    /// Run the operator on one record.
    pub fn apply(&self, record: &BoxedValue) -> Result<BoxedValue> {
        match self {
            OperatorFactory::SelectKey { apply, .. } | OperatorFactory::MapValues { apply, .. } => {
                apply(record)
            }
        }
    }
}

impl std::fmt::Debug for OperatorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatorFactory::SelectKey { node_id, .. } => write!(f, "SelectKey({node_id})"),
            OperatorFactory::MapValues { node_id, .. } => write!(f, "MapValues({node_id})"),
        }
    }
}

fn record_fn<K, V, KR, VR, F>(f: F) -> Arc<RecordFn>
where
    K: StreamData,
    V: StreamData,
    KR: StreamData,
    VR: StreamData,
    F: Fn(&K, &V) -> (KR, VR) + Send + Sync + 'static,
{
    Arc::new(move |record: &BoxedValue| {
        let (key, value) = record.downcast_ref::<(K, V)>().ok_or_else(|| {
            anyhow!(
                "expected a ({}, {}) record, got {}",
                std::any::type_name::<K>(),
                std::any::type_name::<V>(),
                record.type_name()
            )
        })?;
        Ok(BoxedValue::new(f(key, value)))
    })
}

/// A stream of `(K, V)` records.
///
/// Created by [`StreamsBuilder::stream`](crate::environment::StreamsBuilder::stream).
/// Call [`group_by_key`](Self::group_by_key) or [`group_by`](Self::group_by)
/// before aggregating.
pub struct KStream<K, V> {
    pub(crate) env: Rc<RefCell<EnvInner>>,
    pub(crate) node_id: NodeId,
    /// Topic the records were read from.
    pub(crate) topic: String,
    pub(crate) partitions: Option<u32>,
    /// Set once the key was changed since the topic was read.
    pub(crate) repartition_required: bool,
    pub(crate) _phantom: PhantomData<fn() -> (K, V)>,
}

impl<K, V> KStream<K, V>
where
    K: StreamData,
    V: StreamData,
{
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    fn add_operator<KR, VR>(
        self,
        prefix: &str,
        make: impl FnOnce(NodeId) -> OperatorFactory,
        rekeyed: bool,
    ) -> Result<KStream<KR, VR>, TopologyError> {
        let mut inner = self.env.borrow_mut();
        let name = inner.graph.new_processor_name(prefix);
        let node_id = inner
            .graph
            .add_node(&[self.node_id], NodeSpec::new(name, NodeKind::Processor))?;
        inner.operators.push(make(node_id));
        drop(inner);

        Ok(KStream {
            env: self.env,
            node_id,
            topic: self.topic,
            partitions: self.partitions,
            repartition_required: self.repartition_required || rekeyed,
            _phantom: PhantomData,
        })
    }

    /// Derive a new key for every record. Aggregating the result
    /// repartitions it by the new key.
    pub fn select_key<KR, F>(self, key_fn: F) -> Result<KStream<KR, V>, TopologyError>
    where
        KR: StreamData,
        F: Fn(&K, &V) -> KR + Send + Sync + 'static,
    {
        let apply = record_fn(move |k: &K, v: &V| (key_fn(k, v), v.clone()));
        self.add_operator(
            KEY_SELECT_NAME,
            |node_id| OperatorFactory::SelectKey { node_id, apply },
            true,
        )
    }

    /// Transform every value, keeping the key.
    pub fn map_values<VR, F>(self, value_fn: F) -> Result<KStream<K, VR>, TopologyError>
    where
        VR: StreamData,
        F: Fn(&V) -> VR + Send + Sync + 'static,
    {
        let apply = record_fn(move |k: &K, v: &V| (k.clone(), value_fn(v)));
        self.add_operator(
            MAP_VALUES_NAME,
            |node_id| OperatorFactory::MapValues { node_id, apply },
            false,
        )
    }

    /// Group by the current key.
    pub fn group_by_key(self) -> Result<KGroupedStream<K, V>, TopologyError> {
        self.group_by_key_with(Grouped::new())
    }

    /// Group by the current key, naming the repartition topic and codecs.
    pub fn group_by_key_with(self, grouped: Grouped) -> Result<KGroupedStream<K, V>, TopologyError> {
        let id = self.env.borrow_mut().graph.new_stream_id();
        let mut stream = GroupedStream::new(id, self.node_id, self.topic)
            .with_repartition_required(self.repartition_required);
        if let Some(partitions) = self.partitions {
            stream = stream.with_partitions(partitions);
        }
        if let Some(codec) = grouped.key_codec {
            stream = stream.with_key_codec(codec);
        }
        if let Some(codec) = grouped.value_codec {
            stream = stream.with_value_codec(codec);
        }
        if let Some(name) = grouped.name {
            stream = stream.with_repartition_name(name)?;
        }

        Ok(KGroupedStream {
            env: self.env,
            stream,
            _phantom: PhantomData,
        })
    }

    /// Re-key with `key_fn` and group by the new key.
    pub fn group_by<KR, F>(self, key_fn: F, grouped: Grouped) -> Result<KGroupedStream<KR, V>, TopologyError>
    where
        KR: StreamData,
        F: Fn(&K, &V) -> KR + Send + Sync + 'static,
    {
        self.select_key(key_fn)?.group_by_key_with(grouped)
    }
}

/// A grouped stream, ready to be cogrouped with others.
pub struct KGroupedStream<K, V> {
    pub(crate) env: Rc<RefCell<EnvInner>>,
    pub(crate) stream: GroupedStream,
    pub(crate) _phantom: PhantomData<fn() -> (K, V)>,
}

impl<K, V> KGroupedStream<K, V>
where
    K: StreamData,
    V: StreamData,
{
    pub fn grouped_stream(&self) -> &GroupedStream {
        &self.stream
    }

    pub(crate) fn entry<VA, F>(&self, aggregator: F) -> CogroupEntry<K, VA>
    where
        VA: StreamData,
        F: Fn(&K, &V, VA) -> VA + Send + Sync + 'static,
    {
        CogroupEntry::new(self.stream.clone(), Aggregator::new(aggregator))
    }

    /// Start a cogroup with this stream as its first input.
    pub fn cogroup<VA, F>(&self, aggregator: F) -> CogroupedKStream<K, VA>
    where
        VA: StreamData,
        F: Fn(&K, &V, VA) -> VA + Send + Sync + 'static,
    {
        CogroupedKStream {
            env: Rc::clone(&self.env),
            entries: vec![self.entry(aggregator)],
        }
    }
}
