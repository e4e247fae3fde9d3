//! Authorization policy: visibility, permissions, and responsible rules.
//!
//! Everything here is pure and synchronous. Services feed it principals,
//! tasks, and directory lookups; it answers allow/deny or a read predicate.

pub mod permissions;
pub mod responsibles;
pub mod visibility;

pub use permissions::{DenialReason, Decision, Operation, Relationship, authorize};
pub use responsibles::{ApprovedResponsibles, ResponsibleRejection, validate_responsibles};
pub use visibility::{
    Clause, SortDirection, SortField, TaskFilters, TaskPredicate, TaskSort, ViewType,
    VisibilityError, resolve_visibility,
};
