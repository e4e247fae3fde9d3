//! Users, departments, roles, and the authenticated principal.

use super::{DepartmentId, ParseValueError, TaskDomainError, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five-level role hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Unrestricted operator with no department.
    SuperAdmin,
    /// Department administrator.
    Admin,
    /// Department supervisor.
    Encargado,
    /// Regular department member.
    Usuario,
    /// Guest without a department.
    Invitado,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "SUPER_ADMIN",
            Self::Admin => "ADMIN",
            Self::Encargado => "ENCARGADO",
            Self::Usuario => "USUARIO",
            Self::Invitado => "INVITADO",
        }
    }

    /// Position in the hierarchy; higher outranks lower.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::SuperAdmin => 4,
            Self::Admin => 3,
            Self::Encargado => 2,
            Self::Usuario => 1,
            Self::Invitado => 0,
        }
    }

    /// Returns `true` when `self` sits strictly above `other`.
    #[must_use]
    pub const fn outranks(self, other: Self) -> bool {
        self.rank() > other.rank()
    }

    /// Returns `true` when users of this role must belong to a department.
    #[must_use]
    pub const fn requires_department(self) -> bool {
        matches!(self, Self::Admin | Self::Encargado | Self::Usuario)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            "ADMIN" => Ok(Self::Admin),
            "ENCARGADO" => Ok(Self::Encargado),
            "USUARIO" => Ok(Self::Usuario),
            "INVITADO" => Ok(Self::Invitado),
            _ => Err(ParseValueError::new("role", value)),
        }
    }
}

/// Account activity status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserStatus {
    /// The account may be assigned work and receives notifications.
    #[serde(rename = "ACTIVO")]
    Active,
    /// The account is soft-deactivated.
    #[serde(rename = "INACTIVO")]
    Inactive,
}

impl UserStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVO",
            Self::Inactive => "INACTIVO",
        }
    }
}

impl TryFrom<&str> for UserStatus {
    type Error = ParseValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ACTIVO" => Ok(Self::Active),
            "INACTIVO" => Ok(Self::Inactive),
            _ => Err(ParseValueError::new("user status", value)),
        }
    }
}

/// Department classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepartmentKind {
    /// Back-office department.
    #[serde(rename = "ADMINISTRATIVO")]
    Administrative,
    /// Operations department.
    #[serde(rename = "OPERATIVO")]
    Operational,
}

impl DepartmentKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Administrative => "ADMINISTRATIVO",
            Self::Operational => "OPERATIVO",
        }
    }
}

impl TryFrom<&str> for DepartmentKind {
    type Error = ParseValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMINISTRATIVO" => Ok(Self::Administrative),
            "OPERATIVO" => Ok(Self::Operational),
            _ => Err(ParseValueError::new("department kind", value)),
        }
    }
}

/// An organisational department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Department identifier.
    pub id: DepartmentId,
    /// Unique display name.
    pub name: String,
    /// Department classification.
    pub kind: DepartmentKind,
    /// Members of a quality department may read sensitive tasks.
    pub quality: bool,
}

impl Department {
    /// Creates a non-quality department.
    #[must_use]
    pub fn new(id: DepartmentId, name: impl Into<String>, kind: DepartmentKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            quality: false,
        }
    }

    /// Marks the department as a quality department.
    #[must_use]
    pub const fn with_quality(mut self, quality: bool) -> Self {
        self.quality = quality;
        self
    }
}

/// Parameter object for building a [`User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub display_name: String,
    /// Login name.
    pub login: String,
    /// Opaque credential hash, never interpreted by this crate.
    pub password_hash: String,
    /// Role in the hierarchy.
    pub role: Role,
    /// Owning department, if the role has one.
    pub department: Option<DepartmentId>,
    /// Activity status.
    pub status: UserStatus,
}

/// A provisioned user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    display_name: String,
    login: String,
    #[serde(skip)]
    password_hash: String,
    role: Role,
    department: Option<DepartmentId>,
    status: UserStatus,
}

impl User {
    /// Builds a user, enforcing the role/department invariant.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DepartmentRequired`] or
    /// [`TaskDomainError::DepartmentForbidden`] when the department does not
    /// match what the role demands.
    pub fn new(data: UserData) -> Result<Self, TaskDomainError> {
        match (data.role.requires_department(), data.department) {
            (true, None) => return Err(TaskDomainError::DepartmentRequired { role: data.role }),
            (false, Some(_)) => {
                return Err(TaskDomainError::DepartmentForbidden { role: data.role });
            }
            _ => {}
        }
        Ok(Self {
            id: data.id,
            display_name: data.display_name,
            login: data.login,
            password_hash: data.password_hash,
            role: data.role,
            department: data.department,
            status: data.status,
        })
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the login name.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Returns the stored credential hash.
    #[must_use]
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Returns the role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the owning department, if any.
    #[must_use]
    pub const fn department(&self) -> Option<DepartmentId> {
        self.department
    }

    /// Returns the activity status.
    #[must_use]
    pub const fn status(&self) -> UserStatus {
        self.status
    }

    /// Returns `true` for active accounts.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.status, UserStatus::Active)
    }
}

/// Department facts carried by a principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentMembership {
    /// Department identifier.
    pub id: DepartmentId,
    /// Department display name.
    pub name: String,
    /// Whether the department is a quality department.
    pub quality: bool,
}

impl From<&Department> for DepartmentMembership {
    fn from(department: &Department) -> Self {
        Self {
            id: department.id,
            name: department.name.clone(),
            quality: department.quality,
        }
    }
}

/// The authenticated caller of a request.
///
/// Produced by the credential layer; every service operation takes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    user_id: UserId,
    role: Role,
    department: Option<DepartmentMembership>,
}

impl Principal {
    /// Creates a department-less principal.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            department: None,
        }
    }

    /// Attaches department membership.
    #[must_use]
    pub fn with_department(mut self, department: &Department) -> Self {
        self.department = Some(DepartmentMembership::from(department));
        self
    }

    /// Builds a principal from a stored user and its department.
    #[must_use]
    pub fn from_user(user: &User, department: Option<&Department>) -> Self {
        Self {
            user_id: user.id(),
            role: user.role(),
            department: department.map(DepartmentMembership::from),
        }
    }

    /// Returns the caller's user identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the caller's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the caller's department membership, if any.
    #[must_use]
    pub const fn department(&self) -> Option<&DepartmentMembership> {
        self.department.as_ref()
    }

    /// Returns the caller's department identifier, if any.
    #[must_use]
    pub fn department_id(&self) -> Option<DepartmentId> {
        self.department.as_ref().map(|membership| membership.id)
    }

    /// Returns `true` for super administrators.
    #[must_use]
    pub const fn is_super_admin(&self) -> bool {
        matches!(self.role, Role::SuperAdmin)
    }

    /// Returns `true` when the caller belongs to a quality department.
    #[must_use]
    pub fn in_quality_department(&self) -> bool {
        self.department
            .as_ref()
            .is_some_and(|membership| membership.quality)
    }
}
