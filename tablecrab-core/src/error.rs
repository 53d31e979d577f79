//! # Error Types
//!
//! Build-time and codec errors. All of them are structural: they are raised
//! synchronously while a topology or a single message is being constructed
//! and are never retried.

use thiserror::Error;

use crate::types::{Millis, NodeId};
use crate::window::WindowKind;

/// Errors raised while assembling a topology.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// A cogroup was requested without any input stream.
    #[error("cogroup requires at least one input stream")]
    EmptyCogroup,

    /// Inputs of one aggregation cannot be placed on the same partitions.
    #[error(
        "topics {topics:?} must be co-partitioned but have partition counts {partitions:?}"
    )]
    CopartitionViolation {
        topics: Vec<String>,
        partitions: Vec<u32>,
    },

    /// Two graph nodes were given the same name.
    #[error("node name `{0}` is already used in this topology")]
    DuplicateNodeName(String),

    /// A parent id does not exist in the graph.
    #[error("unknown graph node {0}")]
    UnknownNode(NodeId),

    /// A user-supplied name contains illegal characters or is too long.
    #[error("invalid name `{name}`: {reason}")]
    InvalidName { name: String, reason: String },

    /// Session-window aggregation requested without a session merger.
    #[error("session windowed aggregation requires a session merger")]
    MissingSessionMerger,

    /// An internal topic would receive a generated name while explicit naming is enforced.
    #[error("internal resource `{resource}` would get a generated name; provide a name explicitly")]
    ImplicitInternalName { resource: String },

    /// A window definition is not valid.
    #[error("invalid window: {0}")]
    InvalidWindow(String),

    /// The requested store retention cannot hold a full window plus its grace period.
    #[error("store `{store}` retention {retention_ms}ms is smaller than the required {required_ms}ms")]
    InvalidRetention {
        store: String,
        retention_ms: Millis,
        required_ms: Millis,
    },

    /// A versioned store was requested behind a windowed aggregation.
    #[error("store `{store}` is versioned but backs a {kind} aggregation; only rolling aggregations support versioning")]
    VersionedWindowStore { store: String, kind: WindowKind },
}

/// Errors raised by the wire codecs.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The message version does not fit the 7-bit version field.
    #[error("subscription response version cannot be negative (got {0})")]
    InvalidVersion(i8),

    /// The value codec has not been bound yet.
    #[error("value codec is not bound; call bind_if_unset before use")]
    NotReady,

    /// The input buffer is truncated or otherwise not a valid message.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// The inner value codec failed.
    #[error("value codec failed: {0}")]
    Value(anyhow::Error),
}
