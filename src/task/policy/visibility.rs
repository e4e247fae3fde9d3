//! Visibility resolution: which tasks a principal may read.
//!
//! The resolver never touches storage. It produces a [`TaskPredicate`], a
//! conjunction of typed clauses, that each repository adapter translates into
//! its own query language. Rows outside the predicate are never fetched.

use crate::task::domain::{
    DepartmentId, Principal, Role, Task, TaskId, TaskStatus, Urgency, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// Client hint selecting an ENCARGADO's list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewType {
    /// Tasks where the caller is responsible.
    MisTareas,
    /// Tasks the caller created.
    Asignadas,
    /// Everything the role may see.
    Todas,
}

/// Optional list filters supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilters {
    /// Restrict to a department.
    pub department: Option<DepartmentId>,
    /// Restrict to a creator.
    pub created_by: Option<UserId>,
    /// Restrict to tasks with this responsible.
    pub responsible: Option<UserId>,
    /// Restrict to a status.
    pub status: Option<TaskStatus>,
    /// Restrict to an urgency.
    pub urgency: Option<Urgency>,
    /// Deadline lower bound (inclusive).
    pub deadline_from: Option<DateTime<Utc>>,
    /// Deadline upper bound (inclusive).
    pub deadline_until: Option<DateTime<Utc>>,
    /// Case-insensitive substring of title or notes.
    pub query: Option<String>,
    /// ENCARGADO view hint.
    pub view: Option<ViewType>,
}

/// A single predicate clause. A task matches a predicate when it matches
/// every clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Task has this identifier.
    Id(TaskId),
    /// Task belongs to this department.
    Department(DepartmentId),
    /// Task was created by this user.
    CreatedBy(UserId),
    /// This user is a listed responsible.
    HasResponsible(UserId),
    /// No listed responsible has this role.
    NoResponsibleWithRole(Role),
    /// Status is one of these.
    StatusIn(Vec<TaskStatus>),
    /// Urgency equals this value.
    Urgency(Urgency),
    /// Deadline is at or after this instant.
    DeadlineFrom(DateTime<Utc>),
    /// Deadline is at or before this instant.
    DeadlineUntil(DateTime<Utc>),
    /// Title or notes contain this text, ignoring case.
    Text(String),
    /// Titles starting with `marker` are hidden unless `user` is responsible.
    SensitiveHiddenUnless {
        /// Reserved title prefix.
        marker: String,
        /// The principal who may still see their own sensitive tasks.
        user: UserId,
    },
}

/// Conjunction of clauses applied by the persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPredicate {
    clauses: Vec<Clause>,
}

impl TaskPredicate {
    /// A predicate matching every task.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }

    /// Adds a clause.
    #[must_use]
    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Returns the clauses.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Evaluates the predicate against an in-memory task.
    ///
    /// `role_of` resolves a user's role for
    /// [`Clause::NoResponsibleWithRole`]; unknown users never match a role.
    pub fn matches(&self, task: &Task, role_of: impl Fn(UserId) -> Option<Role>) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Id(id) => task.id() == *id,
            Clause::Department(department) => task.department() == *department,
            Clause::CreatedBy(user) => task.creator() == *user,
            Clause::HasResponsible(user) => task.is_responsible(*user),
            Clause::NoResponsibleWithRole(role) => !task
                .responsibles()
                .iter()
                .any(|user| role_of(*user) == Some(*role)),
            Clause::StatusIn(statuses) => statuses.contains(&task.status()),
            Clause::Urgency(urgency) => task.urgency() == *urgency,
            Clause::DeadlineFrom(from) => task.deadline() >= *from,
            Clause::DeadlineUntil(until) => task.deadline() <= *until,
            Clause::Text(text) => {
                let needle = text.to_lowercase();
                task.title().to_lowercase().contains(&needle)
                    || task.notes().to_lowercase().contains(&needle)
            }
            Clause::SensitiveHiddenUnless { marker, user } => {
                !task.is_sensitive(marker) || task.is_responsible(*user)
            }
        })
    }
}

/// Sortable list fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Creation timestamp.
    CreatedAt,
    /// Deadline.
    Deadline,
    /// Urgency rank.
    Urgency,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

/// Requested list ordering. Without one, lists are id-descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSort {
    /// Field to sort by.
    pub field: SortField,
    /// Direction.
    pub direction: SortDirection,
}

impl TaskSort {
    /// Compares two tasks under an optional sort; ties break id-descending.
    #[must_use]
    pub fn compare(sort: Option<Self>, a: &Task, b: &Task) -> Ordering {
        let primary = sort.map_or(Ordering::Equal, |requested| {
            let ascending = match requested.field {
                SortField::CreatedAt => a.created_at().cmp(&b.created_at()),
                SortField::Deadline => a.deadline().cmp(&b.deadline()),
                SortField::Urgency => a.urgency().rank().cmp(&b.urgency().rank()),
            };
            match requested.direction {
                SortDirection::Asc => ascending,
                SortDirection::Desc => ascending.reverse(),
            }
        });
        primary.then_with(|| b.id().cmp(&a.id()))
    }
}

/// Errors raised while resolving visibility.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VisibilityError {
    /// A department-scoped role has no department.
    #[error("role {0} requires a department to list tasks")]
    NoDepartment(Role),
}

/// Produces the read predicate for `principal`.
///
/// The role's base clauses come first; filters the role may use are ANDed on
/// top, others are dropped. The sensitive-title clause is added for every
/// principal who is neither SUPER_ADMIN nor in a quality department.
///
/// # Errors
///
/// Returns [`VisibilityError::NoDepartment`] when an ADMIN or ENCARGADO has
/// no department.
pub fn resolve_visibility(
    principal: &Principal,
    filters: &TaskFilters,
    sensitive_marker: &str,
) -> Result<TaskPredicate, VisibilityError> {
    let me = principal.user_id();
    let mut predicate = match principal.role() {
        Role::SuperAdmin => {
            let mut base = TaskPredicate::all();
            if let Some(department) = filters.department {
                base = base.and(Clause::Department(department));
            }
            narrow_by_people(base, filters, true)
        }
        Role::Admin => {
            let department = principal
                .department_id()
                .ok_or(VisibilityError::NoDepartment(Role::Admin))?;
            narrow_by_people(
                TaskPredicate::all().and(Clause::Department(department)),
                filters,
                true,
            )
        }
        Role::Encargado => {
            let department = principal
                .department_id()
                .ok_or(VisibilityError::NoDepartment(Role::Encargado))?;
            let base = TaskPredicate::all().and(Clause::Department(department));
            let scoped = match filters.view {
                Some(ViewType::Asignadas) => base.and(Clause::CreatedBy(me)),
                Some(ViewType::MisTareas) => base.and(Clause::HasResponsible(me)),
                Some(ViewType::Todas) | None => base.and(Clause::NoResponsibleWithRole(Role::Admin)),
            };
            narrow_by_people(scoped, filters, true)
        }
        Role::Usuario | Role::Invitado => narrow_by_people(
            TaskPredicate::all().and(Clause::HasResponsible(me)),
            filters,
            false,
        ),
    };

    predicate = narrow_by_attributes(predicate, filters);

    if !principal.is_super_admin() && !principal.in_quality_department() {
        predicate = predicate.and(Clause::SensitiveHiddenUnless {
            marker: sensitive_marker.to_owned(),
            user: me,
        });
    }
    Ok(predicate)
}

fn narrow_by_people(
    mut predicate: TaskPredicate,
    filters: &TaskFilters,
    responsible_filter_allowed: bool,
) -> TaskPredicate {
    if let Some(creator) = filters.created_by {
        predicate = predicate.and(Clause::CreatedBy(creator));
    }
    if responsible_filter_allowed && let Some(responsible) = filters.responsible {
        predicate = predicate.and(Clause::HasResponsible(responsible));
    }
    predicate
}

fn narrow_by_attributes(mut predicate: TaskPredicate, filters: &TaskFilters) -> TaskPredicate {
    if let Some(status) = filters.status {
        predicate = predicate.and(Clause::StatusIn(vec![status]));
    }
    if let Some(urgency) = filters.urgency {
        predicate = predicate.and(Clause::Urgency(urgency));
    }
    if let Some(from) = filters.deadline_from {
        predicate = predicate.and(Clause::DeadlineFrom(from));
    }
    if let Some(until) = filters.deadline_until {
        predicate = predicate.and(Clause::DeadlineUntil(until));
    }
    if let Some(query) = filters
        .query
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
    {
        predicate = predicate.and(Clause::Text(query.to_owned()));
    }
    predicate
}
