//! # TableCrab Core
//!
//! Build-time core of the TableCrab stream table engine.
//!
//! - [`graph`]: the topology graph under construction ([`StreamGraph`](graph::StreamGraph)),
//!   the [`TopologyBuilder`](graph::TopologyBuilder) seam and topology descriptions.
//! - [`cogroup`]: turns several grouped streams into one aggregated table:
//!   repartition planning, per-input aggregate nodes and the merge node.
//! - [`window`]: window specifications and their grace periods.
//! - [`store`]: descriptors of the state stores behind aggregations.
//! - [`codec`]: key and value codecs.
//! - [`foreign_key`]: the subscription response message of foreign-key joins.

pub mod codec;
pub mod cogroup;
pub mod config;
pub mod error;
pub mod foreign_key;
pub mod graph;
pub mod store;
pub mod types;
pub mod window;

pub use config::TopologyConfig;
pub use error::{CodecError, TopologyError};
