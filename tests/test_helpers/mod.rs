//! Shared seeding for integration tests: a small plant with two
//! departments, one user per role, and a service wired to in-memory
//! adapters.

use chrono::NaiveDate;
use mockable::DefaultClock;
use std::sync::Arc;
use tareas::task::{
    adapters::memory::{
        InMemoryAuditLog, InMemoryObjectStorage, InMemoryTaskStore, RecordingNotificationSink,
    },
    domain::{
        AuditAction, Department, DepartmentId, DepartmentKind, NotificationIntent, Principal, Role,
        User, UserData, UserId, UserStatus,
    },
    services::{EffectPorts, TaskLifecycleService},
};

pub const DIRECTORA: i64 = 1;
pub const ADMIN_PRODUCCION: i64 = 2;
pub const ENCARGADO_PRODUCCION: i64 = 3;
pub const OPERARIA: i64 = 4;
pub const OPERARIO: i64 = 5;
pub const VISITANTE: i64 = 6;
pub const ENCARGADO_LOGISTICA: i64 = 7;
pub const MOZO_LOGISTICA: i64 = 8;

pub const PRODUCCION: i64 = 1;
pub const LOGISTICA: i64 = 2;

/// Service over the in-memory adapters with the wall clock.
pub type OfficeService = TaskLifecycleService<InMemoryTaskStore, InMemoryTaskStore, DefaultClock>;

pub fn user_id(raw: i64) -> UserId {
    UserId::new(raw).expect("valid user id")
}

pub fn department_id(raw: i64) -> DepartmentId {
    DepartmentId::new(raw).expect("valid department id")
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn departments() -> Vec<Department> {
    vec![
        Department::new(department_id(PRODUCCION), "Producción", DepartmentKind::Operational),
        Department::new(department_id(LOGISTICA), "Logística", DepartmentKind::Operational),
    ]
}

fn user(id: i64, name: &str, role: Role, department: Option<i64>) -> User {
    User::new(UserData {
        id: user_id(id),
        display_name: name.to_owned(),
        login: name.to_lowercase().replace(' ', "."),
        password_hash: "$argon2id$v=19$fixture".to_owned(),
        role,
        department: department.map(department_id),
        status: UserStatus::Active,
    })
    .expect("valid user")
}

fn users() -> Vec<User> {
    vec![
        user(DIRECTORA, "Rosa Directora", Role::SuperAdmin, None),
        user(ADMIN_PRODUCCION, "Tomas Admin", Role::Admin, Some(PRODUCCION)),
        user(ENCARGADO_PRODUCCION, "Nuria Encargada", Role::Encargado, Some(PRODUCCION)),
        user(OPERARIA, "Lucia Operaria", Role::Usuario, Some(PRODUCCION)),
        user(OPERARIO, "Mario Operario", Role::Usuario, Some(PRODUCCION)),
        user(VISITANTE, "Ines Visitante", Role::Invitado, None),
        user(ENCARGADO_LOGISTICA, "Pablo Encargado", Role::Encargado, Some(LOGISTICA)),
        user(MOZO_LOGISTICA, "Diego Mozo", Role::Usuario, Some(LOGISTICA)),
    ]
}

/// Builds the principal of a seeded user.
pub fn principal(raw: i64) -> Principal {
    let found = users()
        .into_iter()
        .find(|candidate| candidate.id().value() == raw)
        .expect("seeded user");
    let all = departments();
    let department = found
        .department()
        .and_then(|id| all.iter().find(|candidate| candidate.id == id));
    Principal::from_user(&found, department)
}

/// Seeded store plus the service and every effect port.
pub struct Office {
    pub store: Arc<InMemoryTaskStore>,
    pub audit: Arc<InMemoryAuditLog>,
    pub sink: Arc<RecordingNotificationSink>,
    pub storage: Arc<InMemoryObjectStorage>,
    pub service: OfficeService,
}

impl Office {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryTaskStore::new());
        for department in departments() {
            store.upsert_department(department).expect("seed department");
        }
        for seeded in users() {
            store.upsert_user(seeded).expect("seed user");
        }
        let audit = Arc::new(InMemoryAuditLog::new());
        let sink = Arc::new(RecordingNotificationSink::new());
        let storage = Arc::new(InMemoryObjectStorage::new());
        let audit_port = Arc::clone(&audit);
        let sink_port = Arc::clone(&sink);
        let storage_port = Arc::clone(&storage);
        let service = TaskLifecycleService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            EffectPorts {
                audit: audit_port,
                notifications: sink_port,
                storage: storage_port,
            },
            Arc::new(DefaultClock),
        );
        Self {
            store,
            audit,
            sink,
            storage,
            service,
        }
    }

    pub fn audit_actions(&self) -> Vec<AuditAction> {
        self.audit
            .entries()
            .expect("audit entries")
            .into_iter()
            .map(|entry| entry.action)
            .collect()
    }

    pub fn intents(&self) -> Vec<NotificationIntent> {
        self.sink.intents()
    }
}

impl Default for Office {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves a seeded user by first name.
pub fn seeded_id(first_name: &str) -> Option<i64> {
    users()
        .into_iter()
        .find(|candidate| candidate.display_name().split(' ').next() == Some(first_name))
        .map(|found| found.id().value())
}

/// Resolves a seeded department by name.
pub fn seeded_department(name: &str) -> Option<i64> {
    departments()
        .into_iter()
        .find(|candidate| candidate.name == name)
        .map(|found| found.id.value())
}
