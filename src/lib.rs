//! Tareas: departmental task assignment with review and deadline tracking.
//!
//! The crate models who may see and act on a task, the review lifecycle
//! between a task's creator and its responsibles, the append-only deadline
//! history, and the audit and notification side effects every mutation
//! produces.
//!
//! # Architecture
//!
//! Tareas follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Policy**: Visibility, permission, and responsible rules as pure functions
//! - **Ports**: Abstract trait interfaces for storage, audit, and push delivery
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//!
//! # Modules
//!
//! - [`config`]: Environment-driven policy and database settings
//! - [`task`]: The task core

pub mod config;
pub mod task;
