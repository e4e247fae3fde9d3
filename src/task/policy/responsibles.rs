//! Validation of responsible sets against the role hierarchy.

use crate::task::domain::{DepartmentId, Principal, Role, User, UserId};
use std::collections::BTreeSet;
use thiserror::Error;

/// A responsible set that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovedResponsibles(BTreeSet<UserId>);

impl ApprovedResponsibles {
    /// Returns the approved users.
    #[must_use]
    pub const fn users(&self) -> &BTreeSet<UserId> {
        &self.0
    }

    /// Consumes the set.
    #[must_use]
    pub fn into_inner(self) -> BTreeSet<UserId> {
        self.0
    }
}

/// Why a responsible set was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResponsibleRejection {
    /// No candidate was supplied.
    #[error("at least one responsible is required")]
    Empty,

    /// Some candidates do not exist or are inactive.
    #[error("responsibles do not exist or are inactive: {0:?}")]
    InvalidResponsibles(Vec<UserId>),

    /// A department-scoped actor targeted another department.
    #[error("cannot assign work outside your own department")]
    DepartmentMismatch {
        /// The actor's department.
        actor_department: Option<DepartmentId>,
        /// The department the task belongs to.
        target_department: DepartmentId,
    },

    /// A candidate sits outside what the actor may assign.
    #[error("user {candidate} with role {role} cannot be assigned by this creator")]
    HierarchyViolation {
        /// Offending candidate.
        candidate: UserId,
        /// The candidate's role.
        role: Role,
    },
}

/// Validates `requested` for a task in `target_department` created by
/// `actor`.
///
/// `candidates` holds whatever users the directory found for the requested
/// ids; missing or inactive ones reject the whole set. Duplicates collapse.
///
/// # Errors
///
/// Returns the first [`ResponsibleRejection`] that applies, checked in the
/// order existence, department, hierarchy.
pub fn validate_responsibles(
    actor: &Principal,
    target_department: DepartmentId,
    requested: &[UserId],
    candidates: &[User],
) -> Result<ApprovedResponsibles, ResponsibleRejection> {
    let wanted: BTreeSet<UserId> = requested.iter().copied().collect();
    if wanted.is_empty() {
        return Err(ResponsibleRejection::Empty);
    }

    let invalid: Vec<UserId> = wanted
        .iter()
        .copied()
        .filter(|id| {
            !candidates
                .iter()
                .any(|user| user.id() == *id && user.is_active())
        })
        .collect();
    if !invalid.is_empty() {
        return Err(ResponsibleRejection::InvalidResponsibles(invalid));
    }

    if !actor.is_super_admin() && actor.department_id() != Some(target_department) {
        return Err(ResponsibleRejection::DepartmentMismatch {
            actor_department: actor.department_id(),
            target_department,
        });
    }

    for user in candidates.iter().filter(|user| wanted.contains(&user.id())) {
        if !may_assign(actor.role(), user, target_department) {
            return Err(ResponsibleRejection::HierarchyViolation {
                candidate: user.id(),
                role: user.role(),
            });
        }
    }

    Ok(ApprovedResponsibles(wanted))
}

/// Whether a creator of `actor_role` may assign `candidate` to a task in
/// `target_department`.
///
/// ENCARGADO may assign USUARIO of the department and INVITADO, nobody else.
#[must_use]
pub fn may_assign(actor_role: Role, candidate: &User, target_department: DepartmentId) -> bool {
    let same_department = candidate.department() == Some(target_department);
    match actor_role {
        Role::SuperAdmin => true,
        Role::Admin => match candidate.role() {
            Role::Encargado | Role::Usuario => same_department,
            Role::Invitado => true,
            Role::SuperAdmin | Role::Admin => false,
        },
        Role::Encargado => match candidate.role() {
            Role::Usuario => same_department,
            Role::Invitado => true,
            Role::SuperAdmin | Role::Admin | Role::Encargado => false,
        },
        Role::Usuario | Role::Invitado => false,
    }
}
