//! # fastworker-transport
//!
//! Request/Reply, Bus and Pair socket-pattern primitives over TCP, framed
//! with a length-delimited codec. These are the only transport capabilities
//! the dispatch core is allowed to depend on.

pub mod bus;
pub mod error;
pub mod framing;
pub mod pair;
pub mod reqrep;

pub use error::{TransportError, TransportResult};
