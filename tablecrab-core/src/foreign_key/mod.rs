//! Messages exchanged by the two sides of a foreign-key table join.

pub mod codec;
pub mod response;

pub use codec::*;
pub use response::*;
