//! `PostgreSQL` repository implementation for task storage.

use super::{
    models::{
        DeadlineChangeRow, ImageRow, NewDeadlineChangeRow, NewImageRow, NewTaskRow,
        ResponsibleRow, TaskChangeset, TaskRow,
    },
    run_blocking,
    schema::{deadline_changes, task_images, task_responsibles, tasks, users},
};
use crate::config::PgPool;
use crate::task::{
    domain::{
        DeadlineChange, DeadlineChangeId, DeadlineChangeKind, DepartmentId, ImageId, ImageUrl,
        NewDeadlineChange, NewTask, PersistedTaskData, Task, TaskId, TaskImage, TaskStatus,
        Urgency, UserId, deadline::to_seconds,
    },
    policy::{Clause, SortDirection, SortField, TaskPredicate, TaskSort},
    ports::{
        TaskPage, TaskQuery, TaskRepository, TaskRepositoryError, TaskRepositoryResult, TaskUpdate,
    },
};
use async_trait::async_trait;
use diesel::dsl::{not, sql};
use diesel::expression::SqlLiteral;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::SmallInt;
use std::collections::{BTreeMap, BTreeSet};

type BoxedTaskQuery = tasks::BoxedQuery<'static, Pg>;

/// `PostgreSQL`-backed task repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn create(&self, task: NewTask) -> TaskRepositoryResult<Task> {
        let row = new_task_row(&task);
        let responsibles: Vec<i64> = task.responsibles().iter().map(|user| user.value()).collect();

        let loaded = run_blocking(&self.pool, move |connection| {
            connection
                .transaction::<_, DieselError, _>(|conn| {
                    let inserted = diesel::insert_into(tasks::table)
                        .values(&row)
                        .returning(TaskRow::as_returning())
                        .get_result(conn)?;
                    let links: Vec<ResponsibleRow> = responsibles
                        .iter()
                        .map(|&user_id| ResponsibleRow {
                            task_id: inserted.id,
                            user_id,
                        })
                        .collect();
                    diesel::insert_into(task_responsibles::table)
                        .values(&links)
                        .execute(conn)?;
                    load_children(conn, vec![inserted])
                })
                .map_err(write_error)
        })
        .await?;

        loaded.into_task()?.ok_or_else(|| {
            TaskRepositoryError::persistence(std::io::Error::other(
                "inserted task was not returned",
            ))
        })
    }

    async fn apply(&self, update: TaskUpdate) -> TaskRepositoryResult<Task> {
        let task_id = update.task.id();
        let id = task_id.value();
        let expected = update.expected_status;
        let changes = changeset(&update.task);
        let links: Option<Vec<ResponsibleRow>> = update.responsibles.map(|responsibles| {
            responsibles
                .iter()
                .map(|user| ResponsibleRow {
                    task_id: id,
                    user_id: user.value(),
                })
                .collect()
        });
        let history: Vec<NewDeadlineChangeRow> = update
            .history
            .iter()
            .map(|change| new_change_row(id, change))
            .collect();
        let images: Vec<NewImageRow> = update
            .images
            .iter()
            .map(|image| NewImageRow {
                task_id: id,
                url: image.url.as_str().to_owned(),
                created_at: to_seconds(image.uploaded_at),
            })
            .collect();

        let loaded = run_blocking(&self.pool, move |connection| {
            connection
                .transaction::<_, ApplyFailure, _>(|conn| {
                    let updated = diesel::update(
                        tasks::table
                            .find(id)
                            .filter(tasks::status.eq(expected.as_str())),
                    )
                    .set(&changes)
                    .returning(TaskRow::as_returning())
                    .get_result(conn)
                    .optional()?;
                    let Some(updated) = updated else {
                        let exists: i64 = tasks::table.find(id).count().get_result(conn)?;
                        return Err(if exists == 0 {
                            ApplyFailure::Missing
                        } else {
                            ApplyFailure::StatusChanged
                        });
                    };
                    if let Some(replacement) = &links {
                        diesel::delete(
                            task_responsibles::table.filter(task_responsibles::task_id.eq(id)),
                        )
                        .execute(conn)?;
                        diesel::insert_into(task_responsibles::table)
                            .values(replacement)
                            .execute(conn)?;
                    }
                    if !history.is_empty() {
                        diesel::insert_into(deadline_changes::table)
                            .values(&history)
                            .execute(conn)?;
                    }
                    if !images.is_empty() {
                        diesel::insert_into(task_images::table)
                            .values(&images)
                            .execute(conn)?;
                    }
                    Ok(load_children(conn, vec![updated])?)
                })
                .map_err(|err| match err {
                    ApplyFailure::Missing => TaskRepositoryError::NotFound(task_id),
                    ApplyFailure::StatusChanged => TaskRepositoryError::StatusChanged {
                        id: task_id,
                        expected,
                    },
                    ApplyFailure::Database(other) => write_error(other),
                })
        })
        .await?;

        loaded
            .into_task()?
            .ok_or(TaskRepositoryError::NotFound(task_id))
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let raw = id.value();
        let loaded = run_blocking(&self.pool, move |connection| {
            connection
                .build_transaction()
                .read_only()
                .run::<_, DieselError, _>(|conn| {
                    let rows = tasks::table
                        .find(raw)
                        .select(TaskRow::as_select())
                        .load(conn)?;
                    load_children(conn, rows)
                })
                .map_err(TaskRepositoryError::persistence)
        })
        .await?;
        loaded.into_task()
    }

    async fn list(&self, query: &TaskQuery) -> TaskRepositoryResult<TaskPage> {
        let predicate = query.predicate.clone();
        let sort = query.sort;
        let offset = i64::try_from(query.page.offset()).map_err(TaskRepositoryError::persistence)?;
        let limit = i64::from(query.page.per_page());

        let (total, loaded) = run_blocking(&self.pool, move |connection| {
            connection
                .build_transaction()
                .read_only()
                .repeatable_read()
                .run::<_, DieselError, _>(|conn| {
                    let total: i64 = filtered(&predicate).count().get_result(conn)?;
                    let rows = sorted(filtered(&predicate), sort)
                        .offset(offset)
                        .limit(limit)
                        .select(TaskRow::as_select())
                        .load(conn)?;
                    Ok((total, load_children(conn, rows)?))
                })
                .map_err(TaskRepositoryError::persistence)
        })
        .await?;

        Ok(TaskPage {
            items: loaded.into_tasks()?,
            total: u64::try_from(total).map_err(TaskRepositoryError::persistence)?,
            page: query.page.page(),
            per_page: query.page.per_page(),
        })
    }

    async fn find_matching(&self, predicate: &TaskPredicate) -> TaskRepositoryResult<Vec<Task>> {
        let owned = predicate.clone();
        let loaded = run_blocking(&self.pool, move |connection| {
            connection
                .build_transaction()
                .read_only()
                .repeatable_read()
                .run::<_, DieselError, _>(|conn| {
                    let rows = sorted(filtered(&owned), None)
                        .select(TaskRow::as_select())
                        .load(conn)?;
                    load_children(conn, rows)
                })
                .map_err(TaskRepositoryError::persistence)
        })
        .await?;
        loaded.into_tasks()
    }

    async fn find_image(&self, id: ImageId) -> TaskRepositoryResult<Option<TaskImage>> {
        let raw = id.value();
        let row = run_blocking(&self.pool, move |connection| {
            task_images::table
                .find(raw)
                .select(ImageRow::as_select())
                .first(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)
        })
        .await?;
        row.map(row_to_image).transpose()
    }

    async fn delete_image(&self, id: ImageId) -> TaskRepositoryResult<()> {
        let raw = id.value();
        let deleted = run_blocking(&self.pool, move |connection| {
            diesel::delete(task_images::table.find(raw))
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)
        })
        .await?;
        if deleted == 0 {
            return Err(TaskRepositoryError::ImageNotFound(id));
        }
        Ok(())
    }
}

/// Task rows and their child rows, read together.
#[derive(Debug, Default)]
struct TaskRows {
    tasks: Vec<TaskRow>,
    responsibles: Vec<ResponsibleRow>,
    history: Vec<DeadlineChangeRow>,
    images: Vec<ImageRow>,
}

impl TaskRows {
    fn into_task(self) -> TaskRepositoryResult<Option<Task>> {
        Ok(self.into_tasks()?.into_iter().next())
    }

    /// Assembles aggregates, keeping the order of `tasks`.
    fn into_tasks(self) -> TaskRepositoryResult<Vec<Task>> {
        let mut responsibles: BTreeMap<i64, BTreeSet<UserId>> = BTreeMap::new();
        for link in self.responsibles {
            responsibles
                .entry(link.task_id)
                .or_default()
                .insert(UserId::new(link.user_id).map_err(TaskRepositoryError::persistence)?);
        }
        let mut history: BTreeMap<i64, Vec<DeadlineChange>> = BTreeMap::new();
        for row in self.history {
            let owner = row.task_id;
            history.entry(owner).or_default().push(row_to_change(row)?);
        }
        let mut images: BTreeMap<i64, Vec<TaskImage>> = BTreeMap::new();
        for row in self.images {
            let owner = row.task_id;
            images.entry(owner).or_default().push(row_to_image(row)?);
        }

        self.tasks
            .into_iter()
            .map(|row| {
                let id = row.id;
                row_to_task(
                    row,
                    responsibles.remove(&id).unwrap_or_default(),
                    history.remove(&id).unwrap_or_default(),
                    images.remove(&id).unwrap_or_default(),
                )
            })
            .collect()
    }
}

fn load_children(connection: &mut PgConnection, rows: Vec<TaskRow>) -> QueryResult<TaskRows> {
    if rows.is_empty() {
        return Ok(TaskRows::default());
    }
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let responsibles = task_responsibles::table
        .filter(task_responsibles::task_id.eq_any(ids.clone()))
        .select(ResponsibleRow::as_select())
        .load(connection)?;
    let history = deadline_changes::table
        .filter(deadline_changes::task_id.eq_any(ids.clone()))
        .order(deadline_changes::id.asc())
        .select(DeadlineChangeRow::as_select())
        .load(connection)?;
    let images = task_images::table
        .filter(task_images::task_id.eq_any(ids))
        .order(task_images::id.asc())
        .select(ImageRow::as_select())
        .load(connection)?;
    Ok(TaskRows {
        tasks: rows,
        responsibles,
        history,
        images,
    })
}

/// Translates a visibility predicate into a `WHERE` conjunction.
fn filtered(predicate: &TaskPredicate) -> BoxedTaskQuery {
    predicate
        .clauses()
        .iter()
        .fold(tasks::table.into_boxed(), |query, clause| match clause {
            Clause::Id(id) => query.filter(tasks::id.eq(id.value())),
            Clause::Department(department) => {
                query.filter(tasks::department_id.eq(department.value()))
            }
            Clause::CreatedBy(user) => query.filter(tasks::creator_id.eq(user.value())),
            Clause::HasResponsible(user) => query.filter(tasks::id.eq_any(
                task_responsibles::table
                    .filter(task_responsibles::user_id.eq(user.value()))
                    .select(task_responsibles::task_id),
            )),
            Clause::NoResponsibleWithRole(role) => query.filter(not(tasks::id.eq_any(
                task_responsibles::table
                    .inner_join(users::table)
                    .filter(users::role.eq(role.as_str()))
                    .select(task_responsibles::task_id),
            ))),
            Clause::StatusIn(statuses) => query.filter(
                tasks::status.eq_any(statuses.iter().map(|status| status.as_str()).collect::<Vec<_>>()),
            ),
            Clause::Urgency(urgency) => query.filter(tasks::urgency.eq(urgency.as_str())),
            Clause::DeadlineFrom(from) => query.filter(tasks::deadline.ge(*from)),
            Clause::DeadlineUntil(until) => query.filter(tasks::deadline.le(*until)),
            Clause::Text(text) => {
                let pattern = format!("%{}%", escape_like(text));
                query.filter(
                    tasks::title
                        .ilike(pattern.clone())
                        .or(tasks::notes.ilike(pattern)),
                )
            }
            Clause::SensitiveHiddenUnless { marker, .. } if marker.is_empty() => query,
            Clause::SensitiveHiddenUnless { marker, user } => query.filter(
                not(tasks::title.like(format!("{}%", escape_like(marker)))).or(tasks::id.eq_any(
                    task_responsibles::table
                        .filter(task_responsibles::user_id.eq(user.value()))
                        .select(task_responsibles::task_id),
                )),
            ),
        })
}

/// Applies the requested ordering; ties and unsorted lists fall back to
/// id-descending.
fn sorted(query: BoxedTaskQuery, sort: Option<TaskSort>) -> BoxedTaskQuery {
    let Some(requested) = sort else {
        return query.order_by(tasks::id.desc());
    };
    let primary = match (requested.field, requested.direction) {
        (SortField::CreatedAt, SortDirection::Asc) => query.order_by(tasks::created_at.asc()),
        (SortField::CreatedAt, SortDirection::Desc) => query.order_by(tasks::created_at.desc()),
        (SortField::Deadline, SortDirection::Asc) => query.order_by(tasks::deadline.asc()),
        (SortField::Deadline, SortDirection::Desc) => query.order_by(tasks::deadline.desc()),
        (SortField::Urgency, SortDirection::Asc) => query.order_by(urgency_rank().asc()),
        (SortField::Urgency, SortDirection::Desc) => query.order_by(urgency_rank().desc()),
    };
    primary.then_order_by(tasks::id.desc())
}

/// Must agree with [`Urgency::rank`].
fn urgency_rank() -> SqlLiteral<SmallInt> {
    sql::<SmallInt>("CASE tasks.urgency WHEN 'BAJA' THEN 0 WHEN 'MEDIA' THEN 1 ELSE 2 END")
}

/// Escapes `LIKE` wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

/// Why a guarded update wrote nothing.
enum ApplyFailure {
    Missing,
    StatusChanged,
    Database(DieselError),
}

impl From<DieselError> for ApplyFailure {
    fn from(err: DieselError) -> Self {
        Self::Database(err)
    }
}

fn write_error(err: DieselError) -> TaskRepositoryError {
    match err {
        DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation,
            info,
        ) => TaskRepositoryError::Conflict(info.message().to_owned()),
        other => TaskRepositoryError::persistence(other),
    }
}

fn new_task_row(task: &NewTask) -> NewTaskRow {
    NewTaskRow {
        title: task.title().to_owned(),
        notes: task.notes().to_owned(),
        status: TaskStatus::Pending.as_str().to_owned(),
        urgency: task.urgency().as_str().to_owned(),
        department_id: task.department().value(),
        creator_id: task.creator().value(),
        deadline: task.deadline(),
        created_at: task.created_at(),
        updated_at: task.created_at(),
    }
}

fn changeset(task: &Task) -> TaskChangeset {
    TaskChangeset {
        title: task.title().to_owned(),
        notes: task.notes().to_owned(),
        status: task.status().as_str().to_owned(),
        urgency: task.urgency().as_str().to_owned(),
        department_id: task.department().value(),
        deadline: task.deadline(),
        updated_at: task.updated_at(),
        completed_at: task.completed_at(),
        delivered_at: task.delivered_at(),
        delivery_comment: task.delivery_comment().map(str::to_owned),
        reviewed_at: task.reviewed_at(),
        review_feedback: task.review_feedback().map(str::to_owned),
    }
}

fn new_change_row(task_id: i64, change: &NewDeadlineChange) -> NewDeadlineChangeRow {
    NewDeadlineChangeRow {
        task_id,
        previous_deadline: change.previous,
        new_deadline: change.new,
        reason: change.reason.clone(),
        kind: change.kind.as_str().to_owned(),
        changed_by: change.actor.value(),
        changed_at: change.changed_at,
    }
}

fn row_to_task(
    row: TaskRow,
    responsibles: BTreeSet<UserId>,
    history: Vec<DeadlineChange>,
    images: Vec<TaskImage>,
) -> TaskRepositoryResult<Task> {
    let data = PersistedTaskData {
        id: TaskId::new(row.id).map_err(TaskRepositoryError::persistence)?,
        title: row.title,
        notes: row.notes,
        status: TaskStatus::try_from(row.status.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        urgency: Urgency::try_from(row.urgency.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        department: DepartmentId::new(row.department_id)
            .map_err(TaskRepositoryError::persistence)?,
        creator: UserId::new(row.creator_id).map_err(TaskRepositoryError::persistence)?,
        responsibles,
        deadline: row.deadline,
        created_at: row.created_at,
        updated_at: row.updated_at,
        completed_at: row.completed_at,
        delivered_at: row.delivered_at,
        delivery_comment: row.delivery_comment,
        reviewed_at: row.reviewed_at,
        review_feedback: row.review_feedback,
        history,
        images,
    };
    Ok(Task::from_persisted(data))
}

fn row_to_change(row: DeadlineChangeRow) -> TaskRepositoryResult<DeadlineChange> {
    Ok(DeadlineChange {
        id: DeadlineChangeId::new(row.id).map_err(TaskRepositoryError::persistence)?,
        previous: row.previous_deadline,
        new: row.new_deadline,
        reason: row.reason,
        kind: DeadlineChangeKind::try_from(row.kind.as_str())
            .map_err(TaskRepositoryError::persistence)?,
        actor: UserId::new(row.changed_by).map_err(TaskRepositoryError::persistence)?,
        changed_at: row.changed_at,
    })
}

fn row_to_image(row: ImageRow) -> TaskRepositoryResult<TaskImage> {
    Ok(TaskImage {
        id: ImageId::new(row.id).map_err(TaskRepositoryError::persistence)?,
        task_id: TaskId::new(row.task_id).map_err(TaskRepositoryError::persistence)?,
        url: ImageUrl::new(row.url).map_err(TaskRepositoryError::persistence)?,
        created_at: row.created_at,
    })
}
