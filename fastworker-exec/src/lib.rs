//! # fastworker-exec
//!
//! The task registry and execution engine, shared verbatim by the control
//! plane's local-execution fallback and the subworker's task processing
//! loops.

pub mod engine;
pub mod registry;

pub use engine::execute;
pub use registry::{TaskFn, TaskRegistry};
