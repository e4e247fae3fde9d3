//! Task lifecycle core.
//!
//! Tasks belong to a department, are created by one user, and are executed
//! by one or more responsibles. Responsibles deliver; the creator (or an
//! administrator) approves or rejects. Every accepted mutation writes one
//! audit entry and then hands a notification intent to the post-commit
//! sink. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Authorization rules in [`policy`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod policy;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
