//! Task lifecycle orchestration: reads through the visibility resolver,
//! guarded mutations, and their post-commit effects.

use super::effects::{EffectPorts, IntentBuilder, audience, record_audit, submit};
use super::error::{PermissionError, TaskServiceError, TaskServiceResult};
use super::requests::{
    CreateTaskRequest, DeliverTaskRequest, RecordDeadlineRequest, ReviewDecision,
    UpdateTaskRequest,
};
use super::templates::{NotificationContext, NotificationTemplates};
use crate::config::PolicyConfig;
use crate::task::{
    domain::{
        AuditAction, AuditEntry, BusinessCalendar, DeadlineChangeKind, DepartmentId, ImageId,
        ImageUrl, NewDeadlineChange, NewTask, NewTaskData, NotificationKind, Principal,
        StorageCleanup, Task, TaskId, TaskStatus, User, UserId, deadline::to_seconds,
    },
    policy::{
        Clause, Decision, DenialReason, Operation, Relationship, TaskFilters, TaskSort,
        authorize, permissions::role_may_attempt, resolve_visibility, validate_responsibles,
    },
    ports::{PageRequest, TaskPage, TaskQuery, TaskRepository, TaskUpdate, UserDirectory},
};
use chrono::NaiveDate;
use mockable::Clock;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Task lifecycle orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<R, D, C>
where
    R: TaskRepository,
    D: UserDirectory,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    directory: Arc<D>,
    effects: EffectPorts,
    clock: Arc<C>,
    policy: PolicyConfig,
    calendar: BusinessCalendar,
    templates: Arc<NotificationTemplates>,
}

struct Reassignment {
    responsibles: BTreeSet<UserId>,
    added: Vec<User>,
}

impl<R, D, C> TaskLifecycleService<R, D, C>
where
    R: TaskRepository,
    D: UserDirectory,
    C: Clock + Send + Sync,
{
    /// Creates a service with the default policy.
    #[must_use]
    pub fn new(repository: Arc<R>, directory: Arc<D>, effects: EffectPorts, clock: Arc<C>) -> Self {
        let policy = PolicyConfig::default();
        Self {
            repository,
            directory,
            effects,
            clock,
            calendar: policy.calendar(),
            policy,
            templates: Arc::new(NotificationTemplates::new()),
        }
    }

    /// Replaces the policy configuration.
    #[must_use]
    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.calendar = policy.calendar();
        self.policy = policy;
        self
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Lists the tasks `principal` may see, narrowed by `filters`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] when a
    /// department-scoped principal has no department.
    pub async fn list_tasks(
        &self,
        principal: &Principal,
        filters: &TaskFilters,
        sort: Option<TaskSort>,
        page: PageRequest,
    ) -> TaskServiceResult<TaskPage> {
        let predicate = resolve_visibility(principal, filters, &self.policy.sensitive_marker)?;
        let query = TaskQuery {
            predicate,
            sort,
            page,
        };
        Ok(self.repository.list(&query).await?)
    }

    /// Returns one task, gated by the same visibility rules as listing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist
    /// or is not visible to `principal`.
    pub async fn get_task(&self, principal: &Principal, id: TaskId) -> TaskServiceResult<Task> {
        let predicate = resolve_visibility(
            principal,
            &TaskFilters::default(),
            &self.policy.sensitive_marker,
        )?
        .and(Clause::Id(id));
        self.repository
            .find_matching(&predicate)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TaskServiceError::task_not_found(id))
    }

    /// Creates a task in the `PENDIENTE` state and notifies its
    /// responsibles.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] for roles that may not
    /// create or for responsible sets outside the actor's reach, and
    /// [`TaskServiceError::Validation`] for blank titles, missing
    /// departments, or unknown/inactive responsibles.
    pub async fn create_task(
        &self,
        principal: &Principal,
        request: CreateTaskRequest,
    ) -> TaskServiceResult<Task> {
        if !role_may_attempt(Operation::Create, principal.role()) {
            return Err(deny(
                principal,
                Operation::Create,
                DenialReason::RoleNotAllowed,
            ));
        }
        let department_id = request
            .department
            .or_else(|| principal.department_id())
            .ok_or_else(|| {
                TaskServiceError::invalid_field("departamento", "a department is required")
            })?;
        let department = self
            .directory
            .find_department(department_id)
            .await?
            .ok_or_else(|| TaskServiceError::NotFound(format!("department {department_id}")))?;

        let candidates = self.directory.find_users(&request.responsibles).await?;
        let approved =
            validate_responsibles(principal, department_id, &request.responsibles, &candidates)?;

        let new_task = NewTask::new(
            NewTaskData {
                title: request.title,
                notes: request.notes,
                deadline: self.calendar.end_of_day(request.deadline),
                urgency: request.urgency,
                department: department_id,
                creator: principal.user_id(),
                responsibles: approved.into_inner(),
            },
            &*self.clock,
        )?;
        let task = self.repository.create(new_task).await?;
        tracing::info!(
            task_id = %task.id(),
            department = %department_id,
            creator = %principal.user_id(),
            "task created"
        );

        self.audit(
            principal,
            AuditAction::TareaCreada,
            format!("Tarea \"{}\" creada", task.title()),
            json!({
                "tareaId": task.id(),
                "titulo": task.title(),
                "departamento": department.name,
                "responsables": task.responsibles(),
                "fechaLimite": task.deadline(),
                "urgencia": task.urgency(),
            }),
        )
        .await;
        let context = self.intents().context(&task);
        submit(
            self.effects.notifications.as_ref(),
            self.intents().build(
                NotificationKind::NewTask,
                &task,
                audience(&candidates, Some(principal.user_id())),
                &context,
            ),
        );
        Ok(task)
    }

    /// Delivers evidence on a `PENDIENTE` task and notifies its creator.
    ///
    /// Evidence images are written in the same transaction as the status
    /// change.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] unless the principal
    /// is a responsible or SUPER_ADMIN, and [`TaskServiceError::InvalidState`]
    /// unless the task is `PENDIENTE`.
    pub async fn deliver(
        &self,
        principal: &Principal,
        id: TaskId,
        request: DeliverTaskRequest,
    ) -> TaskServiceResult<Task> {
        let mut task = self.load(id).await?;
        self.check(principal, Operation::Deliver, &task).await?;
        let evidence = parse_urls(request.evidence)?;
        let evidence_count = evidence.len();
        let loaded_status = task.status();
        task.deliver(request.comment, &*self.clock)?;

        let updated = self
            .repository
            .apply(
                TaskUpdate::scalar(loaded_status, task).with_images(evidence, self.clock.utc()),
            )
            .await?;
        tracing::info!(task_id = %id, actor = %principal.user_id(), "task delivered");

        self.audit(
            principal,
            AuditAction::TareaEntregada,
            format!("Tarea \"{}\" entregada", updated.title()),
            json!({
                "tareaId": id,
                "departamento": self.department_name(updated.department()).await,
                "comentario": updated.delivery_comment(),
                "evidencias": evidence_count,
            }),
        )
        .await;
        let actor = self.lookup_people(&[principal.user_id()]).await;
        let context = NotificationContext {
            actor: actor.first().map(|user| user.display_name().to_owned()),
            comment: updated.delivery_comment().map(str::to_owned),
            ..self.intents().context(&updated)
        };
        self.notify(
            principal,
            NotificationKind::Delivered,
            &updated,
            &[updated.creator()],
            &context,
        )
        .await;
        Ok(updated)
    }

    /// Approves or rejects the pending delivery of an `EN_REVISION` task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] unless the principal
    /// is SUPER_ADMIN, an ADMIN of the department, or the creator, and
    /// [`TaskServiceError::InvalidState`] unless the task is `EN_REVISION`.
    pub async fn review(
        &self,
        principal: &Principal,
        id: TaskId,
        decision: ReviewDecision,
    ) -> TaskServiceResult<Task> {
        let mut task = self.load(id).await?;
        self.check(principal, Operation::Review, &task).await?;
        let loaded_status = task.status();
        match decision {
            ReviewDecision::Approve { feedback } => {
                self.approve(principal, loaded_status, task, feedback).await
            }
            ReviewDecision::Reject {
                feedback,
                new_deadline,
            } => {
                let extension = new_deadline
                    .map(|date| (self.calendar.end_of_day(date), principal.user_id()));
                let change = task.reject(feedback, extension, &*self.clock)?;
                self.finish_rejection(principal, loaded_status, task, change)
                    .await
            }
        }
    }

    async fn approve(
        &self,
        principal: &Principal,
        loaded_status: TaskStatus,
        mut task: Task,
        feedback: Option<String>,
    ) -> TaskServiceResult<Task> {
        task.approve(feedback, &*self.clock)?;
        let updated = self
            .repository
            .apply(TaskUpdate::scalar(loaded_status, task))
            .await?;
        tracing::info!(task_id = %updated.id(), reviewer = %principal.user_id(), "delivery approved");

        self.audit(
            principal,
            AuditAction::TareaAprobada,
            format!("Tarea \"{}\" aprobada", updated.title()),
            json!({
                "tareaId": updated.id(),
                "departamento": self.department_name(updated.department()).await,
                "retroalimentacion": updated.review_feedback(),
            }),
        )
        .await;
        let context = NotificationContext {
            feedback: updated.review_feedback().map(str::to_owned),
            ..self.intents().context(&updated)
        };
        self.notify_responsibles(principal, NotificationKind::Approved, &updated, &context)
            .await;
        Ok(updated)
    }

    async fn finish_rejection(
        &self,
        principal: &Principal,
        loaded_status: TaskStatus,
        task: Task,
        change: Option<NewDeadlineChange>,
    ) -> TaskServiceResult<Task> {
        let mut details = json!({
            "tareaId": task.id(),
            "departamento": self.department_name(task.department()).await,
            "retroalimentacion": task.review_feedback(),
        });
        if let (Some(extension), Some(fields)) = (&change, details.as_object_mut()) {
            fields.insert("fechaAnterior".to_owned(), json!(extension.previous));
            fields.insert("fechaNueva".to_owned(), json!(extension.new));
        }
        let deadline_changed = change.is_some();
        let mut update = TaskUpdate::scalar(loaded_status, task);
        if let Some(extension) = change {
            update = update.with_history(extension);
        }
        let updated = self.repository.apply(update).await?;
        tracing::info!(
            task_id = %updated.id(),
            reviewer = %principal.user_id(),
            deadline_changed,
            "delivery rejected"
        );

        self.audit(
            principal,
            AuditAction::TareaRechazada,
            format!("Tarea \"{}\" rechazada", updated.title()),
            details,
        )
        .await;
        let context = NotificationContext {
            feedback: updated.review_feedback().map(str::to_owned),
            deadline_changed,
            ..self.intents().context(&updated)
        };
        self.notify_responsibles(principal, NotificationKind::Rejected, &updated, &context)
            .await;
        Ok(updated)
    }

    /// Closes a task directly, bypassing review.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] unless the principal
    /// is SUPER_ADMIN, an ADMIN of the department, or the creating
    /// ENCARGADO, and [`TaskServiceError::InvalidState`] for terminal tasks.
    pub async fn complete(&self, principal: &Principal, id: TaskId) -> TaskServiceResult<Task> {
        let mut task = self.load(id).await?;
        self.check(principal, Operation::Complete, &task).await?;
        let previous = task.status();
        task.complete(&*self.clock)?;
        let updated = self
            .repository
            .apply(TaskUpdate::scalar(previous, task))
            .await?;
        tracing::info!(task_id = %id, actor = %principal.user_id(), "task completed");

        self.audit(
            principal,
            AuditAction::TareaCompletada,
            format!("Tarea \"{}\" concluida", updated.title()),
            json!({
                "tareaId": id,
                "departamento": self.department_name(updated.department()).await,
                "estadoAnterior": previous,
            }),
        )
        .await;
        let context = self.intents().context(&updated);
        self.notify_responsibles(principal, NotificationKind::Completed, &updated, &context)
            .await;
        Ok(updated)
    }

    /// Cancels a non-terminal task.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::complete`].
    pub async fn cancel(&self, principal: &Principal, id: TaskId) -> TaskServiceResult<Task> {
        let mut task = self.load(id).await?;
        self.check(principal, Operation::Cancel, &task).await?;
        let previous = task.status();
        task.cancel(&*self.clock)?;
        let updated = self
            .repository
            .apply(TaskUpdate::scalar(previous, task))
            .await?;
        tracing::info!(task_id = %id, actor = %principal.user_id(), "task cancelled");

        self.audit(
            principal,
            AuditAction::TareaCancelada,
            format!("Tarea \"{}\" cancelada", updated.title()),
            json!({
                "tareaId": id,
                "departamento": self.department_name(updated.department()).await,
                "estadoAnterior": previous,
            }),
        )
        .await;
        let context = self.intents().context(&updated);
        self.notify_responsibles(principal, NotificationKind::Cancelled, &updated, &context)
            .await;
        Ok(updated)
    }

    /// Applies a partial edit.
    ///
    /// Every change is validated before anything is written. A deadline
    /// change appends an `EDIT` history entry; users added to the
    /// responsible set receive a reassignment notification. An edit that
    /// changes nothing writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] when the table refuses
    /// the edit or a non-SUPER_ADMIN changes the department,
    /// [`TaskServiceError::InvalidState`] for status changes the lifecycle
    /// forbids, and [`TaskServiceError::Validation`] for invalid fields.
    pub async fn update_task(
        &self,
        principal: &Principal,
        id: TaskId,
        request: UpdateTaskRequest,
    ) -> TaskServiceResult<Task> {
        let mut task = self.load(id).await?;
        self.check(principal, Operation::Edit, &task).await?;
        let original = task.clone();
        let mut changes = Map::new();

        self.edit_fields(&mut task, &request, &mut changes)?;
        self.edit_department(principal, &mut task, request.department, &mut changes)
            .await?;
        if let Some(status) = request.status {
            let previous = task.status();
            if task.set_status(status, &*self.clock)? {
                record_change(&mut changes, "estatus", &previous, &status);
            }
        }
        let history = self.edit_deadline(principal, &mut task, request.deadline, &mut changes);
        let reassignment = self
            .edit_responsibles(principal, &mut task, request.responsibles.as_deref(), &mut changes)
            .await?;

        if changes.is_empty() {
            return Ok(original);
        }
        let mut update = TaskUpdate::scalar(original.status(), task);
        if let Some(change) = history {
            update = update.with_history(change);
        }
        let mut added = Vec::new();
        if let Some(replaced) = reassignment {
            update = update.with_responsibles(replaced.responsibles);
            added = replaced.added;
        }
        let updated = self.repository.apply(update).await?;
        tracing::info!(task_id = %id, actor = %principal.user_id(), fields = changes.len(), "task updated");

        self.audit(
            principal,
            AuditAction::TareaActualizada,
            format!("Tarea \"{}\" actualizada", updated.title()),
            json!({
                "tareaId": id,
                "departamento": self.department_name(updated.department()).await,
                "cambios": changes,
            }),
        )
        .await;
        let context = self.intents().context(&updated);
        submit(
            self.effects.notifications.as_ref(),
            self.intents().build(
                NotificationKind::Reassigned,
                &updated,
                audience(&added, Some(principal.user_id())),
                &context,
            ),
        );
        Ok(updated)
    }

    fn edit_fields(
        &self,
        task: &mut Task,
        request: &UpdateTaskRequest,
        changes: &mut Map<String, Value>,
    ) -> TaskServiceResult<()> {
        if let Some(title) = &request.title {
            let previous = task.title().to_owned();
            task.rename(title, &*self.clock)?;
            if previous != task.title() {
                record_change(changes, "titulo", &previous, task.title());
            }
        }
        if let Some(notes) = &request.notes
            && notes != task.notes()
        {
            let previous = task.notes().to_owned();
            task.set_notes(notes.clone(), &*self.clock);
            record_change(changes, "notas", &previous, notes);
        }
        if let Some(urgency) = request.urgency
            && urgency != task.urgency()
        {
            let previous = task.urgency();
            task.set_urgency(urgency, &*self.clock);
            record_change(changes, "urgencia", &previous, &urgency);
        }
        Ok(())
    }

    async fn edit_department(
        &self,
        principal: &Principal,
        task: &mut Task,
        requested: Option<DepartmentId>,
        changes: &mut Map<String, Value>,
    ) -> TaskServiceResult<()> {
        let Some(department) = requested.filter(|id| *id != task.department()) else {
            return Ok(());
        };
        if !principal.is_super_admin() {
            tracing::warn!(task_id = %task.id(), user_id = %principal.user_id(), "department change refused");
            return Err(PermissionError::DepartmentChange.into());
        }
        if self.directory.find_department(department).await?.is_none() {
            return Err(TaskServiceError::NotFound(format!("department {department}")));
        }
        let previous = task.department();
        task.move_to_department(department, &*self.clock);
        record_change(changes, "departamento", &previous, &department);
        Ok(())
    }

    fn edit_deadline(
        &self,
        principal: &Principal,
        task: &mut Task,
        requested: Option<NaiveDate>,
        changes: &mut Map<String, Value>,
    ) -> Option<NewDeadlineChange> {
        let deadline = self.calendar.end_of_day(requested?);
        if deadline == task.deadline() {
            return None;
        }
        let change = task.reschedule(
            deadline,
            None,
            DeadlineChangeKind::Edit,
            principal.user_id(),
            &*self.clock,
        );
        record_change(changes, "fechaLimite", &change.previous, &change.new);
        Some(change)
    }

    async fn edit_responsibles(
        &self,
        principal: &Principal,
        task: &mut Task,
        requested: Option<&[UserId]>,
        changes: &mut Map<String, Value>,
    ) -> TaskServiceResult<Option<Reassignment>> {
        let Some(ids) = requested else {
            return Ok(None);
        };
        let candidates = self.directory.find_users(ids).await?;
        let approved = validate_responsibles(principal, task.department(), ids, &candidates)?;
        if approved.users() == task.responsibles() {
            return Ok(None);
        }
        let previous = task.responsibles().clone();
        let added = task.replace_responsibles(approved.into_inner(), &*self.clock)?;
        record_change(changes, "responsables", &previous, task.responsibles());
        Ok(Some(Reassignment {
            responsibles: task.responsibles().clone(),
            added: candidates
                .into_iter()
                .filter(|user| added.contains(&user.id()))
                .collect(),
        }))
    }

    /// Records a deadline change and notifies the responsibles.
    ///
    /// The entry is written even when the date does not move.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::PermissionDenied`] when the table refuses
    /// the change.
    pub async fn record_deadline_change(
        &self,
        principal: &Principal,
        id: TaskId,
        request: RecordDeadlineRequest,
    ) -> TaskServiceResult<Task> {
        let mut task = self.load(id).await?;
        self.check(principal, Operation::RecordDeadline, &task).await?;
        let loaded_status = task.status();
        let change = task.reschedule(
            self.calendar.end_of_day(request.new_deadline),
            request.reason,
            DeadlineChangeKind::Manual,
            principal.user_id(),
            &*self.clock,
        );
        let details = json!({
            "tareaId": id,
            "departamento": self.department_name(task.department()).await,
            "fechaAnterior": change.previous,
            "fechaNueva": change.new,
            "motivo": change.reason,
        });
        let updated = self
            .repository
            .apply(TaskUpdate::scalar(loaded_status, task).with_history(change))
            .await?;
        tracing::info!(task_id = %id, actor = %principal.user_id(), "deadline change recorded");

        self.audit(
            principal,
            AuditAction::HistorialAgregado,
            format!("Fecha límite de \"{}\" modificada", updated.title()),
            details,
        )
        .await;
        let context = NotificationContext {
            feedback: updated.history().first().and_then(|entry| entry.reason.clone()),
            deadline_changed: true,
            ..self.intents().context(&updated)
        };
        self.notify_responsibles(
            principal,
            NotificationKind::DeadlineChanged,
            &updated,
            &context,
        )
        .await;
        Ok(updated)
    }

    /// Attaches already-uploaded images to a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Validation`] when no URL or a blank URL
    /// is supplied.
    pub async fn attach_images(
        &self,
        principal: &Principal,
        id: TaskId,
        urls: Vec<String>,
    ) -> TaskServiceResult<Task> {
        let task = self.load(id).await?;
        self.check(principal, Operation::ManageImages, &task).await?;
        if urls.is_empty() {
            return Err(TaskServiceError::invalid_field(
                "imagenes",
                "at least one image is required",
            ));
        }
        let images = parse_urls(urls)?;
        let listed: Vec<String> = images.iter().map(ToString::to_string).collect();
        let loaded_status = task.status();
        let updated = self
            .repository
            .apply(TaskUpdate::scalar(loaded_status, task).with_images(images, self.clock.utc()))
            .await?;
        tracing::info!(task_id = %id, count = listed.len(), "images attached");

        self.audit(
            principal,
            AuditAction::ImagenesAgregadas,
            format!("{} imagen(es) agregada(s) a \"{}\"", listed.len(), updated.title()),
            json!({
                "tareaId": id,
                "departamento": self.department_name(updated.department()).await,
                "imagenes": listed,
            }),
        )
        .await;
        Ok(updated)
    }

    /// Removes one image, deleting its stored object on a best-effort basis.
    ///
    /// The local row is deleted even when object storage fails; the outcome
    /// is returned and recorded in the audit entry.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] for unknown images and
    /// [`TaskServiceError::PermissionDenied`] when the table refuses image
    /// management on the owning task.
    pub async fn remove_image(
        &self,
        principal: &Principal,
        image_id: ImageId,
    ) -> TaskServiceResult<StorageCleanup> {
        let image = self
            .repository
            .find_image(image_id)
            .await?
            .ok_or_else(|| TaskServiceError::image_not_found(image_id))?;
        let task = self.load(image.task_id).await?;
        self.check(principal, Operation::ManageImages, &task).await?;

        let cleanup = self.effects.storage.delete(&image.url).await.map_or_else(
            |err| {
                tracing::warn!(
                    image_id = %image_id,
                    url = %image.url,
                    error = %err,
                    "object storage delete failed; removing row anyway"
                );
                StorageCleanup::Failed
            },
            |()| StorageCleanup::Deleted,
        );
        self.repository.delete_image(image_id).await?;
        tracing::info!(image_id = %image_id, task_id = %task.id(), cleanup = cleanup.as_str(), "image removed");

        self.audit(
            principal,
            AuditAction::ImagenEliminada,
            format!("Imagen eliminada de \"{}\"", task.title()),
            json!({
                "tareaId": task.id(),
                "departamento": self.department_name(task.department()).await,
                "imagenId": image_id,
                "url": image.url,
                "storage_cleanup": cleanup,
            }),
        )
        .await;
        Ok(cleanup)
    }

    async fn load(&self, id: TaskId) -> TaskServiceResult<Task> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| TaskServiceError::task_not_found(id))
    }

    async fn check(
        &self,
        principal: &Principal,
        operation: Operation,
        task: &Task,
    ) -> TaskServiceResult<()> {
        let creator_role = if matches!(operation, Operation::Edit | Operation::ManageImages) {
            self.directory
                .find_user(task.creator())
                .await?
                .map(|creator| creator.role())
        } else {
            None
        };
        let relationship = Relationship::between(principal, task, creator_role);
        match authorize(operation, principal.role(), relationship) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(deny(principal, operation, reason)),
        }
    }

    async fn audit(
        &self,
        principal: &Principal,
        action: AuditAction,
        description: String,
        details: Value,
    ) {
        let entry = AuditEntry::new(
            action,
            description,
            Some(principal.user_id()),
            details,
            to_seconds(self.clock.utc()),
        );
        record_audit(self.effects.audit.as_ref(), &entry).await;
    }

    async fn notify_responsibles(
        &self,
        principal: &Principal,
        kind: NotificationKind,
        task: &Task,
        context: &NotificationContext,
    ) {
        let recipients: Vec<UserId> = task.responsibles().iter().copied().collect();
        self.notify(principal, kind, task, &recipients, context).await;
    }

    async fn notify(
        &self,
        principal: &Principal,
        kind: NotificationKind,
        task: &Task,
        recipients: &[UserId],
        context: &NotificationContext,
    ) {
        let users = self.lookup_people(recipients).await;
        submit(
            self.effects.notifications.as_ref(),
            self.intents().build(
                kind,
                task,
                audience(&users, Some(principal.user_id())),
                context,
            ),
        );
    }

    async fn lookup_people(&self, ids: &[UserId]) -> Vec<User> {
        self.directory.find_users(ids).await.unwrap_or_else(|err| {
            tracing::error!(error = %err, "recipient lookup failed");
            Vec::new()
        })
    }

    async fn department_name(&self, id: DepartmentId) -> Option<String> {
        self.directory
            .find_department(id)
            .await
            .map_err(|err| tracing::warn!(department = %id, error = %err, "department lookup failed"))
            .ok()
            .flatten()
            .map(|department| department.name)
    }

    fn intents(&self) -> IntentBuilder<'_> {
        IntentBuilder::new(&self.templates, &self.policy)
    }
}

fn deny(principal: &Principal, operation: Operation, reason: DenialReason) -> TaskServiceError {
    tracing::warn!(
        user_id = %principal.user_id(),
        role = %principal.role(),
        operation = %operation,
        reason = %reason,
        "operation denied"
    );
    PermissionError::Denied {
        operation: operation.to_string(),
        reason,
    }
    .into()
}

fn parse_urls(urls: Vec<String>) -> TaskServiceResult<Vec<ImageUrl>> {
    urls.into_iter()
        .map(|url| ImageUrl::new(url).map_err(TaskServiceError::from))
        .collect()
}

fn record_change(
    changes: &mut Map<String, Value>,
    field: &str,
    before: &(impl Serialize + ?Sized),
    after: &(impl Serialize + ?Sized),
) {
    changes.insert(
        field.to_owned(),
        json!({ "antes": before, "despues": after }),
    );
}
