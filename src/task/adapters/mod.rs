//! Adapter implementations of the task ports.
//!
//! - [`memory`]: thread-safe in-memory adapters for tests and prototyping
//! - [`postgres`]: Diesel-backed `PostgreSQL` adapters

pub mod memory;
pub mod postgres;
