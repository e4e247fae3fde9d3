//! Role-scoped listing through the service.

use super::helpers::{create_task, office};
use crate::test_helpers::{
    ADMIN_PRODUCCION, DIRECTORA, ENCARGADO_LOGISTICA, ENCARGADO_PRODUCCION, LOGISTICA,
    MOZO_LOGISTICA, OPERARIA, OPERARIO, Office, PRODUCCION, VISITANTE, date, department_id,
    principal, user_id,
};
use eyre::ensure;
use rstest::rstest;
use tareas::task::{
    domain::{TaskStatus, Urgency},
    policy::{SortDirection, SortField, TaskFilters, TaskSort, ViewType},
    ports::{PageRequest, TaskPage},
    services::{CreateTaskRequest, DeliverTaskRequest},
};

async fn list(
    office: &Office,
    actor: i64,
    filters: TaskFilters,
    sort: Option<TaskSort>,
) -> Result<TaskPage, eyre::Report> {
    Ok(office
        .service
        .list_tasks(&principal(actor), &filters, sort, PageRequest::default())
        .await?)
}

fn titles(page: &TaskPage) -> Vec<&str> {
    page.items.iter().map(|task| task.title()).collect()
}

/// Seeds the plant's work queue; titles identify tasks.
async fn seed(office: &Office) -> Result<(), eyre::Report> {
    create_task(office, ADMIN_PRODUCCION, "Auditoría interna", &[ENCARGADO_PRODUCCION]).await?;
    create_task(office, ADMIN_PRODUCCION, "Limpieza de tolvas", &[OPERARIA]).await?;
    create_task(office, ENCARGADO_PRODUCCION, "Cambio de turno", &[OPERARIA, OPERARIO]).await?;
    create_task(office, ENCARGADO_PRODUCCION, "Acompañar visita", &[VISITANTE]).await?;
    create_task(office, ENCARGADO_LOGISTICA, "Cargar camión", &[MOZO_LOGISTICA]).await?;
    office
        .service
        .create_task(
            &principal(DIRECTORA),
            CreateTaskRequest::new("Plan de calidad", date(2030, 6, 30), [user_id(ADMIN_PRODUCCION)])
                .in_department(department_id(PRODUCCION)),
        )
        .await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn super_admin_sees_every_department(office: Office) -> Result<(), eyre::Report> {
    seed(&office).await?;

    let everything = list(&office, DIRECTORA, TaskFilters::default(), None).await?;
    ensure!(everything.total == 6);

    let logistics = list(
        &office,
        DIRECTORA,
        TaskFilters {
            department: Some(department_id(LOGISTICA)),
            ..TaskFilters::default()
        },
        None,
    )
    .await?;
    ensure!(titles(&logistics) == vec!["Cargar camión"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn admin_sees_their_whole_department(office: Office) -> Result<(), eyre::Report> {
    seed(&office).await?;

    let page = list(&office, ADMIN_PRODUCCION, TaskFilters::default(), None).await?;
    ensure!(
        titles(&page)
            == vec![
                "Plan de calidad",
                "Acompañar visita",
                "Cambio de turno",
                "Limpieza de tolvas",
                "Auditoría interna",
            ]
    );
    Ok(())
}

#[rstest]
#[case(None, vec!["Acompañar visita", "Cambio de turno", "Limpieza de tolvas", "Auditoría interna"])]
#[case(Some(ViewType::Todas), vec!["Acompañar visita", "Cambio de turno", "Limpieza de tolvas", "Auditoría interna"])]
#[case(Some(ViewType::Asignadas), vec!["Acompañar visita", "Cambio de turno"])]
#[case(Some(ViewType::MisTareas), vec!["Auditoría interna"])]
#[tokio::test(flavor = "multi_thread")]
async fn encargado_views_narrow_the_department(
    office: Office,
    #[case] view: Option<ViewType>,
    #[case] expected: Vec<&'static str>,
) -> Result<(), eyre::Report> {
    seed(&office).await?;

    let page = list(
        &office,
        ENCARGADO_PRODUCCION,
        TaskFilters {
            view,
            ..TaskFilters::default()
        },
        None,
    )
    .await?;
    ensure!(titles(&page) == expected, "got {:?}", titles(&page));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn executors_only_see_their_assignments(office: Office) -> Result<(), eyre::Report> {
    seed(&office).await?;

    let operaria = list(&office, OPERARIA, TaskFilters::default(), None).await?;
    ensure!(titles(&operaria) == vec!["Cambio de turno", "Limpieza de tolvas"]);

    let widened = list(
        &office,
        VISITANTE,
        TaskFilters {
            responsible: Some(user_id(OPERARIA)),
            ..TaskFilters::default()
        },
        None,
    )
    .await?;
    ensure!(titles(&widened) == vec!["Acompañar visita"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn filters_and_sorting_combine(office: Office) -> Result<(), eyre::Report> {
    for (title, urgency, day) in [
        ("Revisar caldera", Urgency::High, 10),
        ("Revisar compresor", Urgency::Low, 12),
        ("Pintar señalización", Urgency::High, 11),
        ("Revisar extintores", Urgency::Medium, 9),
    ] {
        office
            .service
            .create_task(
                &principal(ADMIN_PRODUCCION),
                CreateTaskRequest::new(title, date(2030, 7, day), [user_id(OPERARIA)])
                    .with_urgency(urgency),
            )
            .await?;
    }

    let search = list(
        &office,
        ADMIN_PRODUCCION,
        TaskFilters {
            query: Some("revisar".to_owned()),
            ..TaskFilters::default()
        },
        Some(TaskSort {
            field: SortField::Deadline,
            direction: SortDirection::Asc,
        }),
    )
    .await?;
    ensure!(
        titles(&search) == vec!["Revisar extintores", "Revisar caldera", "Revisar compresor"],
        "got {:?}",
        titles(&search)
    );

    let urgent = list(
        &office,
        ADMIN_PRODUCCION,
        TaskFilters {
            urgency: Some(Urgency::High),
            ..TaskFilters::default()
        },
        None,
    )
    .await?;
    ensure!(urgent.total == 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn status_filter_follows_deliveries(office: Office) -> Result<(), eyre::Report> {
    let delivered = create_task(&office, ENCARGADO_PRODUCCION, "Medir ruido", &[OPERARIO]).await?;
    create_task(&office, ENCARGADO_PRODUCCION, "Medir luz", &[OPERARIO]).await?;
    office
        .service
        .deliver(&principal(OPERARIO), delivered.id(), DeliverTaskRequest::new())
        .await?;

    let in_review = list(
        &office,
        ENCARGADO_PRODUCCION,
        TaskFilters {
            status: Some(TaskStatus::InReview),
            ..TaskFilters::default()
        },
        None,
    )
    .await?;
    ensure!(titles(&in_review) == vec!["Medir ruido"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pages_partition_the_result(office: Office) -> Result<(), eyre::Report> {
    for index in 1..=5 {
        create_task(&office, ADMIN_PRODUCCION, &format!("Ronda {index}"), &[OPERARIA]).await?;
    }

    let second = office
        .service
        .list_tasks(
            &principal(OPERARIA),
            &TaskFilters::default(),
            None,
            PageRequest::new(2, 2),
        )
        .await?;
    ensure!(second.total == 5);
    ensure!(titles(&second) == vec!["Ronda 3", "Ronda 2"]);

    let beyond = office
        .service
        .list_tasks(
            &principal(OPERARIA),
            &TaskFilters::default(),
            None,
            PageRequest::new(9, 2),
        )
        .await?;
    ensure!(beyond.items.is_empty());
    ensure!(beyond.total == 5);
    Ok(())
}
