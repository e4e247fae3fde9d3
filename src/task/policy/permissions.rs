//! Role × operation × relationship permission table.
//!
//! Every lifecycle guard in the service layer goes through [`authorize`], so
//! the rules live in one table that tests can enumerate.

use crate::task::domain::{Principal, Role, Task};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operations guarded by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Create a task.
    Create,
    /// Deliver evidence.
    Deliver,
    /// Approve or reject a delivery.
    Review,
    /// Close a task directly.
    Complete,
    /// Cancel a task.
    Cancel,
    /// Edit task fields.
    Edit,
    /// Record a deadline change.
    RecordDeadline,
    /// Attach or remove images.
    ManageImages,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Create => "create",
            Self::Deliver => "deliver",
            Self::Review => "review",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Edit => "edit",
            Self::RecordDeadline => "record deadline",
            Self::ManageImages => "manage images",
        };
        f.write_str(label)
    }
}

/// What must hold between the principal and the task for a rule to allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Nothing beyond the role.
    Always,
    /// Principal belongs to the task's department.
    SameDepartment,
    /// Principal created the task.
    Creator,
    /// Principal is a listed responsible.
    Responsible,
    /// Same department, and the task's creator does not outrank the
    /// principal.
    SameDepartmentCreatorNotAbove,
}

/// Facts linking a principal to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Relationship {
    /// Principal belongs to the task's department.
    pub same_department: bool,
    /// Principal created the task.
    pub is_creator: bool,
    /// Principal is a listed responsible.
    pub is_responsible: bool,
    /// Role of the task's creator, when known.
    pub creator_role: Option<Role>,
}

impl Relationship {
    /// Derives the relationship between `principal` and `task`.
    #[must_use]
    pub fn between(principal: &Principal, task: &Task, creator_role: Option<Role>) -> Self {
        Self {
            same_department: principal.department_id() == Some(task.department()),
            is_creator: task.creator() == principal.user_id(),
            is_responsible: task.is_responsible(principal.user_id()),
            creator_role,
        }
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// No rule exists for the role.
    RoleNotAllowed,
    /// The task belongs to another department.
    OtherDepartment,
    /// Only the task's creator may do this.
    NotCreator,
    /// Only a listed responsible may do this.
    NotResponsible,
    /// The task's creator outranks the principal.
    HierarchyViolation,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::RoleNotAllowed => "role is not allowed to perform this operation",
            Self::OtherDepartment => "task belongs to another department",
            Self::NotCreator => "only the task's creator may perform this operation",
            Self::NotResponsible => "only a listed responsible may perform this operation",
            Self::HierarchyViolation => "task was created by a higher-ranked user",
        };
        f.write_str(message)
    }
}

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The operation may proceed.
    Allow,
    /// The operation is refused.
    Deny(DenialReason),
}

struct Rule {
    operation: Operation,
    role: Role,
    requirement: Requirement,
}

const fn rule(operation: Operation, role: Role, requirement: Requirement) -> Rule {
    Rule {
        operation,
        role,
        requirement,
    }
}

const RULES: &[Rule] = &[
    rule(Operation::Create, Role::SuperAdmin, Requirement::Always),
    rule(Operation::Create, Role::Admin, Requirement::Always),
    rule(Operation::Create, Role::Encargado, Requirement::Always),
    rule(Operation::Deliver, Role::SuperAdmin, Requirement::Always),
    rule(Operation::Deliver, Role::Admin, Requirement::Responsible),
    rule(Operation::Deliver, Role::Encargado, Requirement::Responsible),
    rule(Operation::Deliver, Role::Usuario, Requirement::Responsible),
    rule(Operation::Deliver, Role::Invitado, Requirement::Responsible),
    rule(Operation::Review, Role::SuperAdmin, Requirement::Always),
    rule(Operation::Review, Role::Admin, Requirement::SameDepartment),
    rule(Operation::Review, Role::Admin, Requirement::Creator),
    rule(Operation::Review, Role::Encargado, Requirement::Creator),
    rule(Operation::Review, Role::Usuario, Requirement::Creator),
    rule(Operation::Review, Role::Invitado, Requirement::Creator),
    rule(Operation::Complete, Role::SuperAdmin, Requirement::Always),
    rule(Operation::Complete, Role::Admin, Requirement::SameDepartment),
    rule(Operation::Complete, Role::Encargado, Requirement::Creator),
    rule(Operation::Cancel, Role::SuperAdmin, Requirement::Always),
    rule(Operation::Cancel, Role::Admin, Requirement::SameDepartment),
    rule(Operation::Cancel, Role::Encargado, Requirement::Creator),
    rule(Operation::Edit, Role::SuperAdmin, Requirement::Always),
    rule(Operation::Edit, Role::Admin, Requirement::SameDepartment),
    rule(
        Operation::Edit,
        Role::Encargado,
        Requirement::SameDepartmentCreatorNotAbove,
    ),
    rule(Operation::RecordDeadline, Role::SuperAdmin, Requirement::Always),
    rule(Operation::RecordDeadline, Role::Admin, Requirement::SameDepartment),
    rule(
        Operation::RecordDeadline,
        Role::Encargado,
        Requirement::SameDepartment,
    ),
    rule(Operation::ManageImages, Role::SuperAdmin, Requirement::Always),
    rule(Operation::ManageImages, Role::Admin, Requirement::SameDepartment),
    rule(
        Operation::ManageImages,
        Role::Encargado,
        Requirement::SameDepartmentCreatorNotAbove,
    ),
];

/// Returns `true` when `role` has at least one rule for `operation`.
#[must_use]
pub fn role_may_attempt(operation: Operation, role: Role) -> bool {
    RULES
        .iter()
        .any(|candidate| candidate.operation == operation && candidate.role == role)
}

/// Checks `operation` for a principal of `role` standing in `relationship`
/// to the task.
///
/// Rules for the same role are alternatives: the first satisfied rule allows.
/// When none is satisfied the reason from the first rule is reported.
#[must_use]
pub fn authorize(operation: Operation, role: Role, relationship: Relationship) -> Decision {
    let mut first_denial = None;
    for candidate in RULES
        .iter()
        .filter(|candidate| candidate.operation == operation && candidate.role == role)
    {
        match check(candidate.requirement, role, relationship) {
            None => return Decision::Allow,
            Some(reason) => {
                first_denial.get_or_insert(reason);
            }
        }
    }
    Decision::Deny(first_denial.unwrap_or(DenialReason::RoleNotAllowed))
}

const fn check(requirement: Requirement, role: Role, relationship: Relationship) -> Option<DenialReason> {
    match requirement {
        Requirement::Always => None,
        Requirement::SameDepartment if relationship.same_department => None,
        Requirement::SameDepartment => Some(DenialReason::OtherDepartment),
        Requirement::Creator if relationship.is_creator => None,
        Requirement::Creator => Some(DenialReason::NotCreator),
        Requirement::Responsible if relationship.is_responsible => None,
        Requirement::Responsible => Some(DenialReason::NotResponsible),
        Requirement::SameDepartmentCreatorNotAbove => {
            if !relationship.same_department {
                return Some(DenialReason::OtherDepartment);
            }
            match relationship.creator_role {
                Some(creator) if creator.outranks(role) => Some(DenialReason::HierarchyViolation),
                _ => None,
            }
        }
    }
}
