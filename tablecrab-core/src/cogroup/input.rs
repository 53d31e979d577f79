use crate::cogroup::Aggregator;
use crate::error::TopologyError;
use crate::graph::{CopartitionMember, validate_name};
use crate::types::{NodeId, StreamId};

/// A grouped input stream of a cogroup.
///
/// Identity is the [`StreamId`]: clones of one `GroupedStream` are the same
/// stream and share a single repartition topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedStream {
    id: StreamId,
    node: NodeId,
    topic: String,
    partitions: Option<u32>,
    key_codec: Option<String>,
    value_codec: Option<String>,
    repartition_required: bool,
    repartition_name: Option<String>,
}

impl GroupedStream {
    /// A stream grouped directly under `node`, which reads `topic`.
    pub fn new(id: StreamId, node: NodeId, topic: impl Into<String>) -> Self {
        Self {
            id,
            node,
            topic: topic.into(),
            partitions: None,
            key_codec: None,
            value_codec: None,
            repartition_required: false,
            repartition_name: None,
        }
    }

    pub fn with_partitions(mut self, partitions: u32) -> Self {
        self.partitions = Some(partitions);
        self
    }

    pub fn with_key_codec(mut self, codec_id: impl Into<String>) -> Self {
        self.key_codec = Some(codec_id.into());
        self
    }

    pub fn with_value_codec(mut self, codec_id: impl Into<String>) -> Self {
        self.value_codec = Some(codec_id.into());
        self
    }

    /// Mark the stream as re-keyed: it must pass through a repartition topic.
    pub fn with_repartition_required(mut self, required: bool) -> Self {
        self.repartition_required = required;
        self
    }

    /// Name the repartition topic instead of deriving it from the store name.
    pub fn with_repartition_name(mut self, name: impl Into<String>) -> Result<Self, TopologyError> {
        let name = name.into();
        validate_name(&name)?;
        self.repartition_name = Some(name);
        Ok(self)
    }

    pub fn id(&self) -> StreamId {
        self.id
    }

    /// The upstream node records of this stream come from.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn partitions(&self) -> Option<u32> {
        self.partitions
    }

    pub fn key_codec(&self) -> Option<&str> {
        self.key_codec.as_deref()
    }

    pub fn value_codec(&self) -> Option<&str> {
        self.value_codec.as_deref()
    }

    pub fn repartition_required(&self) -> bool {
        self.repartition_required
    }

    pub fn repartition_name(&self) -> Option<&str> {
        self.repartition_name.as_deref()
    }

    pub(crate) fn source_member(&self) -> CopartitionMember {
        CopartitionMember {
            stream: self.id,
            topic: self.topic.clone(),
            partitions: self.partitions,
            repartitioned: false,
        }
    }
}

/// One input of a cogroup: a stream and the aggregator folding its values.
#[derive(Debug, Clone)]
pub struct CogroupEntry<K, VA> {
    pub stream: GroupedStream,
    pub aggregator: Aggregator<K, VA>,
}

impl<K, VA> CogroupEntry<K, VA> {
    pub fn new(stream: GroupedStream, aggregator: Aggregator<K, VA>) -> Self {
        Self { stream, aggregator }
    }
}
