//! Delivery, review, and closing round trips through the service.

use super::helpers::{create_task, office};
use crate::test_helpers::{
    ADMIN_PRODUCCION, DIRECTORA, ENCARGADO_LOGISTICA, ENCARGADO_PRODUCCION, OPERARIA, OPERARIO,
    Office, date, principal, user_id,
};
use eyre::{bail, ensure};
use rstest::rstest;
use tareas::task::{
    domain::{AuditAction, DeadlineChangeKind, NotificationKind, TaskStatus},
    services::{
        DeliverTaskRequest, ErrorKind, RecordDeadlineRequest, ReviewDecision, UpdateTaskRequest,
    },
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_delivery_can_be_redelivered_and_approved(
    office: Office,
) -> Result<(), eyre::Report> {
    let task = create_task(&office, ENCARGADO_PRODUCCION, "Calibrar prensa", &[OPERARIA]).await?;

    office
        .service
        .deliver(
            &principal(OPERARIA),
            task.id(),
            DeliverTaskRequest::new().with_comment("primera versión"),
        )
        .await?;
    let reopened = office
        .service
        .review(
            &principal(ENCARGADO_PRODUCCION),
            task.id(),
            ReviewDecision::reject(Some("falta la hoja de control"), Some(date(2030, 6, 21))),
        )
        .await?;
    ensure!(reopened.status() == TaskStatus::Pending);
    ensure!(reopened.delivered_at().is_none());

    office
        .service
        .deliver(
            &principal(OPERARIA),
            task.id(),
            DeliverTaskRequest::new()
                .with_comment("con hoja")
                .with_evidence(["https://cdn.local/hoja.jpg".to_owned()]),
        )
        .await?;
    let approved = office
        .service
        .review(
            &principal(ENCARGADO_PRODUCCION),
            task.id(),
            ReviewDecision::approve(None),
        )
        .await?;

    ensure!(approved.status() == TaskStatus::Done);
    ensure!(approved.completed_at().is_some());
    ensure!(approved.delivery_comment() == Some("con hoja"));
    let [extension] = approved.history() else {
        bail!("expected one history entry, got {:?}", approved.history());
    };
    ensure!(extension.kind == DeadlineChangeKind::RejectionExtension);
    ensure!(extension.actor == user_id(ENCARGADO_PRODUCCION));

    ensure!(
        office.audit_actions()
            == vec![
                AuditAction::TareaCreada,
                AuditAction::TareaEntregada,
                AuditAction::TareaRechazada,
                AuditAction::TareaEntregada,
                AuditAction::TareaAprobada,
            ]
    );
    let kinds: Vec<NotificationKind> = office.intents().iter().map(|intent| intent.kind).collect();
    ensure!(
        kinds
            == vec![
                NotificationKind::NewTask,
                NotificationKind::Delivered,
                NotificationKind::Rejected,
                NotificationKind::Delivered,
                NotificationKind::Approved,
            ]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn review_requires_a_pending_delivery(office: Office) -> Result<(), eyre::Report> {
    let task = create_task(&office, ENCARGADO_PRODUCCION, "Engrasar", &[OPERARIO]).await?;

    let result = office
        .service
        .review(
            &principal(ADMIN_PRODUCCION),
            task.id(),
            ReviewDecision::approve(Some("ok")),
        )
        .await;

    match result {
        Err(err) => ensure!(err.kind() == ErrorKind::InvalidState, "unexpected {err}"),
        Ok(reviewed) => bail!("review of a pending task succeeded: {reviewed:?}"),
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closed_tasks_reject_every_further_transition(office: Office) -> Result<(), eyre::Report> {
    let task = create_task(&office, ADMIN_PRODUCCION, "Retirar palets", &[OPERARIA]).await?;
    office.service.cancel(&principal(DIRECTORA), task.id()).await?;

    let deliver = office
        .service
        .deliver(&principal(OPERARIA), task.id(), DeliverTaskRequest::new())
        .await;
    let complete = office
        .service
        .complete(&principal(ADMIN_PRODUCCION), task.id())
        .await;
    let reopen = office
        .service
        .update_task(
            &principal(ADMIN_PRODUCCION),
            task.id(),
            UpdateTaskRequest::new().with_status(TaskStatus::Pending),
        )
        .await;

    for outcome in [deliver, complete, reopen] {
        let Err(err) = outcome else {
            bail!("a cancelled task accepted a transition");
        };
        ensure!(err.kind() == ErrorKind::InvalidState, "unexpected {err}");
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deadline_history_accumulates_newest_first(office: Office) -> Result<(), eyre::Report> {
    let task = create_task(&office, ENCARGADO_PRODUCCION, "Inventario", &[OPERARIA]).await?;

    office
        .service
        .update_task(
            &principal(ENCARGADO_PRODUCCION),
            task.id(),
            UpdateTaskRequest::new().with_deadline(date(2030, 6, 20)),
        )
        .await?;
    let updated = office
        .service
        .record_deadline_change(
            &principal(ADMIN_PRODUCCION),
            task.id(),
            RecordDeadlineRequest::new(date(2030, 6, 28)).with_reason("auditoría externa"),
        )
        .await?;

    let kinds: Vec<DeadlineChangeKind> = updated.history().iter().map(|entry| entry.kind).collect();
    ensure!(kinds.len() == 2);
    ensure!(kinds.contains(&DeadlineChangeKind::Edit));
    ensure!(kinds.contains(&DeadlineChangeKind::Manual));
    let Some(latest) = updated.history().first() else {
        bail!("history is empty");
    };
    ensure!(latest.new == updated.deadline());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn encargados_of_other_departments_are_kept_out(office: Office) -> Result<(), eyre::Report> {
    let task = create_task(&office, ENCARGADO_PRODUCCION, "Orden", &[OPERARIA]).await?;

    let read = office
        .service
        .get_task(&principal(ENCARGADO_LOGISTICA), task.id())
        .await;
    let cancel = office
        .service
        .cancel(&principal(ENCARGADO_LOGISTICA), task.id())
        .await;

    let Err(hidden) = read else {
        bail!("task leaked across departments");
    };
    ensure!(hidden.kind() == ErrorKind::NotFound);
    let Err(denied) = cancel else {
        bail!("cancel crossed departments");
    };
    ensure!(denied.kind() == ErrorKind::PermissionDenied);
    Ok(())
}
