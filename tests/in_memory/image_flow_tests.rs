//! Attaching and removing task images.

use super::helpers::{create_task, office};
use crate::test_helpers::{ADMIN_PRODUCCION, ENCARGADO_PRODUCCION, OPERARIA, Office, principal};
use eyre::{bail, ensure};
use rstest::rstest;
use tareas::task::{
    domain::{AuditAction, StorageCleanup},
    services::{DeliverTaskRequest, ErrorKind},
};

const BEFORE: &str = "https://cdn.local/tareas/antes.jpg";
const AFTER: &str = "https://cdn.local/tareas/despues.jpg";

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn evidence_and_attachments_share_the_gallery(office: Office) -> Result<(), eyre::Report> {
    office.storage.put(BEFORE);
    office.storage.put(AFTER);
    let task = create_task(&office, ENCARGADO_PRODUCCION, "Pulir molde", &[OPERARIA]).await?;

    office
        .service
        .attach_images(&principal(ENCARGADO_PRODUCCION), task.id(), vec![BEFORE.to_owned()])
        .await?;
    let delivered = office
        .service
        .deliver(
            &principal(OPERARIA),
            task.id(),
            DeliverTaskRequest::new().with_evidence([AFTER.to_owned()]),
        )
        .await?;

    let urls: Vec<&str> = delivered.images().iter().map(|image| image.url.as_str()).collect();
    ensure!(urls == vec![BEFORE, AFTER]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn removal_deletes_the_object_and_audits_the_outcome(
    office: Office,
) -> Result<(), eyre::Report> {
    office.storage.put(BEFORE);
    let task = create_task(&office, ENCARGADO_PRODUCCION, "Pulir molde", &[OPERARIA]).await?;
    let attached = office
        .service
        .attach_images(&principal(ADMIN_PRODUCCION), task.id(), vec![BEFORE.to_owned()])
        .await?;
    let Some(image) = attached.images().first() else {
        bail!("no image stored");
    };

    let cleanup = office
        .service
        .remove_image(&principal(ENCARGADO_PRODUCCION), image.id)
        .await?;

    ensure!(cleanup == StorageCleanup::Deleted);
    ensure!(!office.storage.contains(BEFORE));
    ensure!(
        office.audit_actions()
            == vec![
                AuditAction::TareaCreada,
                AuditAction::ImagenesAgregadas,
                AuditAction::ImagenEliminada,
            ]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_objects_still_release_the_row(office: Office) -> Result<(), eyre::Report> {
    let task = create_task(&office, ENCARGADO_PRODUCCION, "Pulir molde", &[OPERARIA]).await?;
    let attached = office
        .service
        .attach_images(&principal(ADMIN_PRODUCCION), task.id(), vec![AFTER.to_owned()])
        .await?;
    let Some(image) = attached.images().first() else {
        bail!("no image stored");
    };
    let image_id = image.id;

    let cleanup = office
        .service
        .remove_image(&principal(ADMIN_PRODUCCION), image_id)
        .await?;
    ensure!(cleanup == StorageCleanup::Failed);

    let second = office
        .service
        .remove_image(&principal(ADMIN_PRODUCCION), image_id)
        .await;
    let Err(err) = second else {
        bail!("image removed twice");
    };
    ensure!(err.kind() == ErrorKind::NotFound);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn executors_cannot_manage_images(office: Office) -> Result<(), eyre::Report> {
    let task = create_task(&office, ENCARGADO_PRODUCCION, "Pulir molde", &[OPERARIA]).await?;

    let result = office
        .service
        .attach_images(&principal(OPERARIA), task.id(), vec![BEFORE.to_owned()])
        .await;

    let Err(err) = result else {
        bail!("executor attached an image");
    };
    ensure!(err.kind() == ErrorKind::PermissionDenied);
    Ok(())
}
