//! # TableCrab API
//!
//! User-facing DSL for cogrouping streams into tables.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tablecrab_api::environment::StreamsBuilder;
//!
//! let builder = StreamsBuilder::new();
//! let clicks = builder
//!     .stream_with_partitions::<String, u32>("clicks", 4)?
//!     .group_by_key()?;
//! let views = builder
//!     .stream_with_partitions::<String, String>("views", 4)?
//!     .group_by_key()?;
//! let table = clicks
//!     .cogroup(|_user: &String, n: &u32, total: u64| total + *n as u64)
//!     .cogroup(&views, |_user: &String, _page: &String, total: u64| total + 1)
//!     .aggregate(|| 0u64)?;
//! println!("{} <- {}", table.name(), builder.describe());
//! # Ok::<(), tablecrab_api::tablecrab_core::TopologyError>(())
//! ```
//!
//! - [`environment`]: [`StreamsBuilder`](environment::StreamsBuilder), the
//!   entry point holding the topology under construction.
//! - [`datastream`]: [`KStream`](datastream::KStream) and
//!   [`KGroupedStream`](datastream::KGroupedStream).
//! - [`cogrouped`]: [`CogroupedKStream`](cogrouped::CogroupedKStream) and its
//!   windowed variants.
//! - [`table`]: [`KTable`](table::KTable), the aggregation result.

pub mod cogrouped;
pub mod datastream;
pub mod environment;
pub mod materialized;
pub mod table;

pub use tablecrab_core;
