//! In-memory task store and user directory for tests.

use super::poisoned;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{
        DeadlineChange, DeadlineChangeId, Department, DepartmentId, ImageId, NewTask, Role, Task,
        TaskId, TaskImage, User, UserId, deadline::to_seconds,
    },
    policy::{TaskPredicate, TaskSort},
    ports::{
        DirectoryError, DirectoryResult, TaskPage, TaskQuery, TaskRepository, TaskRepositoryError,
        TaskRepositoryResult, TaskUpdate, UserDirectory,
    },
};

/// Thread-safe in-memory task repository that doubles as the user
/// directory.
///
/// Like the relational store, it refuses tasks that reference unknown users
/// or departments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<StoreState>>,
}

#[derive(Debug, Default)]
struct StoreState {
    tasks: BTreeMap<TaskId, Task>,
    users: BTreeMap<UserId, User>,
    departments: BTreeMap<DepartmentId, Department>,
    last_task: i64,
    last_change: i64,
    last_image: i64,
}

impl StoreState {
    fn role_of(&self, user: UserId) -> Option<Role> {
        self.users.get(&user).map(User::role)
    }

    /// Matching tasks, id-descending.
    fn matching(&self, predicate: &TaskPredicate) -> Vec<Task> {
        self.tasks
            .values()
            .rev()
            .filter(|task| predicate.matches(task, |user| self.role_of(user)))
            .cloned()
            .collect()
    }

    fn check_references(&self, task: &Task) -> TaskRepositoryResult<()> {
        if !self.departments.contains_key(&task.department()) {
            return Err(TaskRepositoryError::Conflict(format!(
                "unknown department {}",
                task.department()
            )));
        }
        let creator_id = task.creator();
        let creator = std::iter::once(&creator_id);
        if let Some(unknown) = creator
            .chain(task.responsibles())
            .find(|user| !self.users.contains_key(user))
        {
            return Err(TaskRepositoryError::Conflict(format!("unknown user {unknown}")));
        }
        Ok(())
    }
}

fn next_value(counter: &mut i64) -> i64 {
    *counter = counter.saturating_add(1);
    *counter
}

impl InMemoryTaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] if the lock is poisoned.
    pub fn upsert_user(&self, user: User) -> TaskRepositoryResult<()> {
        self.write()?.users.insert(user.id(), user);
        Ok(())
    }

    /// Inserts or replaces a department.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] if the lock is poisoned.
    pub fn upsert_department(&self, department: Department) -> TaskRepositoryResult<()> {
        self.write()?.departments.insert(department.id, department);
        Ok(())
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|err| TaskRepositoryError::persistence(poisoned(&err)))
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|err| TaskRepositoryError::persistence(poisoned(&err)))
    }

    fn read_directory(&self) -> DirectoryResult<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|err| DirectoryError::persistence(poisoned(&err)))
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskStore {
    async fn create(&self, task: NewTask) -> TaskRepositoryResult<Task> {
        let mut state = self.write()?;
        let id = TaskId::new(next_value(&mut state.last_task))
            .map_err(TaskRepositoryError::persistence)?;
        let stored = task.into_task(id);
        state.check_references(&stored)?;
        state.tasks.insert(id, stored.clone());
        Ok(stored)
    }

    async fn apply(&self, update: TaskUpdate) -> TaskRepositoryResult<Task> {
        let mut state = self.write()?;
        let task_id = update.task.id();
        let (mut history, mut images) = {
            let stored = state
                .tasks
                .get(&task_id)
                .ok_or(TaskRepositoryError::NotFound(task_id))?;
            if stored.status() != update.expected_status {
                return Err(TaskRepositoryError::StatusChanged {
                    id: task_id,
                    expected: update.expected_status,
                });
            }
            (stored.history().to_vec(), stored.images().to_vec())
        };

        let mut data = update.task.into_persisted();
        if let Some(responsibles) = update.responsibles {
            data.responsibles = responsibles;
        }
        for change in update.history {
            let change_id = DeadlineChangeId::new(next_value(&mut state.last_change))
                .map_err(TaskRepositoryError::persistence)?;
            history.push(DeadlineChange::persisted(change_id, change));
        }
        for image in update.images {
            let image_id = ImageId::new(next_value(&mut state.last_image))
                .map_err(TaskRepositoryError::persistence)?;
            images.push(TaskImage {
                id: image_id,
                task_id,
                url: image.url,
                created_at: to_seconds(image.uploaded_at),
            });
        }
        data.history = history;
        data.images = images;

        let task = Task::from_persisted(data);
        state.check_references(&task)?;
        state.tasks.insert(task_id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn list(&self, query: &TaskQuery) -> TaskRepositoryResult<TaskPage> {
        let state = self.read()?;
        let mut matching = state.matching(&query.predicate);
        matching.sort_by(|a, b| TaskSort::compare(query.sort, a, b));

        let total = u64::try_from(matching.len()).map_err(TaskRepositoryError::persistence)?;
        let skip =
            usize::try_from(query.page.offset()).map_err(TaskRepositoryError::persistence)?;
        let take =
            usize::try_from(query.page.per_page()).map_err(TaskRepositoryError::persistence)?;
        Ok(TaskPage {
            items: matching.into_iter().skip(skip).take(take).collect(),
            total,
            page: query.page.page(),
            per_page: query.page.per_page(),
        })
    }

    async fn find_matching(&self, predicate: &TaskPredicate) -> TaskRepositoryResult<Vec<Task>> {
        Ok(self.read()?.matching(predicate))
    }

    async fn find_image(&self, id: ImageId) -> TaskRepositoryResult<Option<TaskImage>> {
        Ok(self
            .read()?
            .tasks
            .values()
            .flat_map(Task::images)
            .find(|image| image.id == id)
            .cloned())
    }

    async fn delete_image(&self, id: ImageId) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let owner = state
            .tasks
            .values()
            .find(|task| task.images().iter().any(|image| image.id == id))
            .cloned()
            .ok_or(TaskRepositoryError::ImageNotFound(id))?;
        let mut data = owner.into_persisted();
        data.images.retain(|image| image.id != id);
        let task = Task::from_persisted(data);
        state.tasks.insert(task.id(), task);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryTaskStore {
    async fn find_user(&self, id: UserId) -> DirectoryResult<Option<User>> {
        Ok(self.read_directory()?.users.get(&id).cloned())
    }

    async fn find_users(&self, ids: &[UserId]) -> DirectoryResult<Vec<User>> {
        let state = self.read_directory()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }

    async fn find_department(&self, id: DepartmentId) -> DirectoryResult<Option<Department>> {
        Ok(self.read_directory()?.departments.get(&id).cloned())
    }
}
