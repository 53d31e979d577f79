use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use tablecrab_core::TopologyConfig;
use tablecrab_core::error::TopologyError;
use tablecrab_core::graph::{NodeKind, NodeSpec, StreamGraph, TopologyBuilder, TopologyDescription};
use tablecrab_core::types::StreamData;

use crate::datastream::{KStream, OperatorFactory};

const SOURCE_NAME: &str = "KSTREAM-SOURCE-";

/// Shared mutable state for building the stream graph.
pub(crate) struct EnvInner {
    pub graph: StreamGraph,
    pub operators: Vec<OperatorFactory>,
}

/// The entry point for building a topology.
///
/// Read topics with [`stream`](Self::stream), chain operations on the
/// returned [`KStream`] and inspect the result with [`describe`](Self::describe).
/// Handles created from one builder share its graph.
pub struct StreamsBuilder {
    pub(crate) inner: Rc<RefCell<EnvInner>>,
}

impl StreamsBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::with_config(TopologyConfig::default())
    }

    pub fn with_config(config: TopologyConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EnvInner {
                graph: StreamGraph::with_config(config),
                operators: Vec::new(),
            })),
        }
    }

    pub fn config(&self) -> TopologyConfig {
        self.inner.borrow().graph.config().clone()
    }

    /// Read `topic`, whose partition count is not known up front.
    pub fn stream<K, V>(&self, topic: &str) -> Result<KStream<K, V>, TopologyError>
    where
        K: StreamData,
        V: StreamData,
    {
        self.add_source(topic, None)
    }

    /// Read `topic`, which has `partitions` partitions.
    pub fn stream_with_partitions<K, V>(
        &self,
        topic: &str,
        partitions: u32,
    ) -> Result<KStream<K, V>, TopologyError>
    where
        K: StreamData,
        V: StreamData,
    {
        self.add_source(topic, Some(partitions))
    }

    fn add_source<K, V>(&self, topic: &str, partitions: Option<u32>) -> Result<KStream<K, V>, TopologyError> {
        let mut inner = self.inner.borrow_mut();
        let name = inner.graph.new_processor_name(SOURCE_NAME);
        let node_id = inner.graph.add_node(
            &[],
            NodeSpec::new(
                name,
                NodeKind::Source {
                    topic: topic.to_string(),
                    partitions,
                },
            ),
        )?;
        tracing::debug!("reading topic `{}` ({:?} partitions)", topic, partitions);

        Ok(KStream {
            env: Rc::clone(&self.inner),
            node_id,
            topic: topic.to_string(),
            partitions,
            repartition_required: false,
            _phantom: PhantomData,
        })
    }

    /// The stateless operator registered under node `name`.
    pub fn operator(&self, name: &str) -> Option<OperatorFactory> {
        let inner = self.inner.borrow();
        let node = inner.graph.node_by_name(name)?;
        inner
            .operators
            .iter()
            .find(|op| op.node_id() == node.id)
            .cloned()
    }

    /// Describe the topology assembled so far.
    pub fn describe(&self) -> TopologyDescription {
        self.inner.borrow().graph.describe()
    }
}

impl Default for StreamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
