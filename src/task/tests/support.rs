//! Shared fixtures: a fixed clock, a seeded directory, and a service wired
//! to in-memory adapters.

use crate::task::{
    adapters::memory::{
        InMemoryAuditLog, InMemoryObjectStorage, InMemoryTaskStore, RecordingNotificationSink,
    },
    domain::{
        AuditAction, Department, DepartmentId, DepartmentKind, NewTask, NewTaskData,
        NotificationIntent, Principal, Role, Task, TaskId, Urgency, User, UserData, UserId,
        UserStatus,
    },
    services::{CreateTaskRequest, EffectPorts, TaskLifecycleService},
};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Arc, Mutex};

pub(super) const SUPER_ADMIN: i64 = 1;
pub(super) const ADMIN_MANTENIMIENTO: i64 = 2;
pub(super) const ENCARGADO_MANTENIMIENTO: i64 = 3;
pub(super) const USUARIO_ANA: i64 = 4;
pub(super) const USUARIO_LUIS: i64 = 5;
pub(super) const INVITADO: i64 = 6;
pub(super) const USUARIO_ALMACEN: i64 = 7;
pub(super) const ENCARGADO_ALMACEN: i64 = 8;
pub(super) const USUARIO_CALIDAD: i64 = 9;
pub(super) const USUARIO_INACTIVO: i64 = 10;
pub(super) const ADMIN_ALMACEN: i64 = 11;

pub(super) const MANTENIMIENTO: i64 = 1;
pub(super) const ALMACEN: i64 = 2;
pub(super) const CALIDAD: i64 = 3;

/// Clock pinned to an instant tests can move forward.
#[derive(Debug)]
pub(super) struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub(super) const fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// 2026-03-10 15:00 UTC, 09:00 in the default business offset.
pub(super) fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn user_id(raw: i64) -> UserId {
    UserId::new(raw).expect("valid user id")
}

pub(super) fn department_id(raw: i64) -> DepartmentId {
    DepartmentId::new(raw).expect("valid department id")
}

pub(super) fn task_id(raw: i64) -> TaskId {
    TaskId::new(raw).expect("valid task id")
}

pub(super) fn seed_departments() -> Vec<Department> {
    vec![
        Department::new(
            department_id(MANTENIMIENTO),
            "Mantenimiento",
            DepartmentKind::Operational,
        ),
        Department::new(
            department_id(ALMACEN),
            "Almacén",
            DepartmentKind::Operational,
        ),
        Department::new(
            department_id(CALIDAD),
            "Calidad",
            DepartmentKind::Administrative,
        )
        .with_quality(true),
    ]
}

fn seeded_user(id: i64, name: &str, role: Role, department: Option<i64>) -> User {
    User::new(UserData {
        id: user_id(id),
        display_name: name.to_owned(),
        login: name.to_lowercase().replace(' ', "."),
        password_hash: "$argon2id$v=19$stub".to_owned(),
        role,
        department: department.map(department_id),
        status: UserStatus::Active,
    })
    .expect("valid seeded user")
}

pub(super) fn seed_users() -> Vec<User> {
    let inactive = User::new(UserData {
        id: user_id(USUARIO_INACTIVO),
        display_name: "Pedro Baja".to_owned(),
        login: "pedro.baja".to_owned(),
        password_hash: "$argon2id$v=19$stub".to_owned(),
        role: Role::Usuario,
        department: Some(department_id(MANTENIMIENTO)),
        status: UserStatus::Inactive,
    })
    .expect("valid inactive user");
    vec![
        seeded_user(SUPER_ADMIN, "Sofia Directora", Role::SuperAdmin, None),
        seeded_user(
            ADMIN_MANTENIMIENTO,
            "Marta Admin",
            Role::Admin,
            Some(MANTENIMIENTO),
        ),
        seeded_user(
            ENCARGADO_MANTENIMIENTO,
            "Jorge Encargado",
            Role::Encargado,
            Some(MANTENIMIENTO),
        ),
        seeded_user(USUARIO_ANA, "Ana Torres", Role::Usuario, Some(MANTENIMIENTO)),
        seeded_user(USUARIO_LUIS, "Luis Pardo", Role::Usuario, Some(MANTENIMIENTO)),
        seeded_user(INVITADO, "Iris Invitada", Role::Invitado, None),
        seeded_user(USUARIO_ALMACEN, "Raul Almacen", Role::Usuario, Some(ALMACEN)),
        seeded_user(
            ENCARGADO_ALMACEN,
            "Elena Almacen",
            Role::Encargado,
            Some(ALMACEN),
        ),
        seeded_user(USUARIO_CALIDAD, "Carla Calidad", Role::Usuario, Some(CALIDAD)),
        inactive,
        seeded_user(ADMIN_ALMACEN, "Hugo Admin", Role::Admin, Some(ALMACEN)),
    ]
}

pub(super) fn seeded(raw: i64) -> User {
    seed_users()
        .into_iter()
        .find(|user| user.id().value() == raw)
        .expect("seeded user")
}

/// Builds the principal of a seeded user.
pub(super) fn principal(raw: i64) -> Principal {
    let user = seeded(raw);
    let departments = seed_departments();
    let department = user
        .department()
        .and_then(|id| departments.iter().find(|candidate| candidate.id == id));
    Principal::from_user(&user, department)
}

/// Builds a stored-looking `PENDIENTE` task in Mantenimiento, created by
/// its ENCARGADO and due at the end of 2026-03-20 business time.
pub(super) fn pending_task(id: i64, title: &str, responsibles: &[i64]) -> Task {
    let clock = FixedClock::at(start_instant());
    let calendar = crate::config::PolicyConfig::default().calendar();
    NewTask::new(
        NewTaskData {
            title: title.to_owned(),
            notes: String::new(),
            deadline: calendar.end_of_day(date(2026, 3, 20)),
            urgency: Urgency::Medium,
            department: department_id(MANTENIMIENTO),
            creator: user_id(ENCARGADO_MANTENIMIENTO),
            responsibles: responsibles.iter().copied().map(user_id).collect(),
        },
        &clock,
    )
    .expect("valid new task")
    .into_task(task_id(id))
}

/// A store holding the seeded departments and users.
pub(super) fn seeded_store() -> Arc<InMemoryTaskStore> {
    let store = Arc::new(InMemoryTaskStore::new());
    for department in seed_departments() {
        store.upsert_department(department).expect("seed department");
    }
    for user in seed_users() {
        store.upsert_user(user).expect("seed user");
    }
    store
}

pub(super) type TestService = TaskLifecycleService<InMemoryTaskStore, InMemoryTaskStore, FixedClock>;

/// A service over seeded in-memory adapters, with handles on every port.
pub(super) struct Harness {
    pub(super) store: Arc<InMemoryTaskStore>,
    pub(super) audit: Arc<InMemoryAuditLog>,
    pub(super) sink: Arc<RecordingNotificationSink>,
    pub(super) storage: Arc<InMemoryObjectStorage>,
    pub(super) clock: Arc<FixedClock>,
    pub(super) service: TestService,
}

impl Harness {
    pub(super) fn new() -> Self {
        let store = seeded_store();
        let audit = Arc::new(InMemoryAuditLog::new());
        let sink = Arc::new(RecordingNotificationSink::new());
        let storage = Arc::new(InMemoryObjectStorage::new());
        let clock = Arc::new(FixedClock::at(start_instant()));
        let audit_port = Arc::clone(&audit);
        let sink_port = Arc::clone(&sink);
        let storage_port = Arc::clone(&storage);
        let effects = EffectPorts {
            audit: audit_port,
            notifications: sink_port,
            storage: storage_port,
        };
        let service = TaskLifecycleService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            effects,
            Arc::clone(&clock),
        );
        Self {
            store,
            audit,
            sink,
            storage,
            clock,
            service,
        }
    }

    /// Creates a task due on 2026-03-20 through the service.
    pub(super) async fn create(&self, actor: i64, title: &str, responsibles: &[i64]) -> Task {
        let request = CreateTaskRequest::new(
            title,
            date(2026, 3, 20),
            responsibles.iter().copied().map(user_id),
        );
        self.service
            .create_task(&principal(actor), request)
            .await
            .expect("task creation should succeed")
    }

    pub(super) fn audit_actions(&self) -> Vec<AuditAction> {
        self.audit
            .entries()
            .expect("audit entries")
            .into_iter()
            .map(|entry| entry.action)
            .collect()
    }

    pub(super) fn intents(&self) -> Vec<NotificationIntent> {
        self.sink.intents()
    }
}
