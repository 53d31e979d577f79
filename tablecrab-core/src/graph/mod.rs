//! Graph-domain modules: the build-time topology graph, the builder seam the
//! cogroup planner works against, node naming and topology descriptions.

pub mod builder;
pub mod describe;
pub mod named;
pub mod stream_graph;

pub use builder::*;
pub use describe::*;
pub use named::*;
pub use stream_graph::*;
