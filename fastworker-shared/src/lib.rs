//! # fastworker-shared
//!
//! Domain model, wire message shapes, serialization, configuration and error
//! types shared by the control plane, subworker and client roles.

pub mod addr;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod models;
pub mod serialization;

pub use error::{FastworkerError, FastworkerResult};
