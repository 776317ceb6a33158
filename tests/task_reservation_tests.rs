// Copyright 2025 Cowboy AI, LLC.

//! Task creation with validated, reserved material lines

mod common;

use common::{dec, line, uses, FailingRepository, Harness, Op};
use pretty_assertions::assert_eq;
use siteworks_domain::{
    ConsistencyMode, CoreConfig, Document, EquipmentId, ErrorKind, MaterialId, NewTask,
    ProjectId, StockAction, Store, UserId,
};
use std::sync::Arc;

#[tokio::test]
async fn test_task_reserves_each_line() {
    let h = Harness::new();
    let project = h.project("Riverside").await;
    let foreman = h.user("Avery").await;
    let cement = h.material("Cement", 50, 5).await;
    let sand = h.material("Sand", 30, 5).await;
    let mixer = h.equipment("Mixer").await;

    let mut input = NewTask::new(project, "Pour slab");
    input.assigned_to = Some(foreman);
    let outcome = h
        .services
        .tasks
        .create_task_with_materials(
            input,
            vec![line(cement, 20), line(sand, 10)],
            vec![uses(mixer)],
        )
        .await
        .unwrap();

    assert_eq!(outcome.entity.project(), project);
    assert_eq!(outcome.entity.materials().len(), 2);
    assert_eq!(h.quantity(cement).await, dec(30));
    assert_eq!(h.quantity(sand).await, dec(20));

    let entry = h.services.stock.stock_history(cement).await.unwrap().pop().unwrap();
    assert_eq!(entry.action, StockAction::Used);
    assert_eq!(entry.project, Some(project));
    assert_eq!(entry.updated_by, Some(foreman));
    assert_eq!(
        h.sink.event_types().last().map(String::as_str),
        Some("TaskCreated")
    );
}

#[tokio::test]
async fn test_insufficient_total_fails_before_any_reservation() {
    let h = Harness::new();
    let project = h.project("Riverside").await;
    let cement = h.material("Cement", 50, 5).await;
    let sand = h.material("Sand", 30, 5).await;
    let mixer = h.equipment("Mixer").await;

    let err = h
        .services
        .tasks
        .create_task_with_materials(
            NewTask::new(project, "Pour slab"),
            vec![line(sand, 5), line(cement, 30), line(cement, 30)],
            vec![uses(mixer)],
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    assert!(err.to_string().contains("60"), "{err}");
    assert_eq!(h.quantity(cement).await, dec(50));
    assert_eq!(h.quantity(sand).await, dec(30));
    assert!(h.services.projects.project_tasks(project).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_task_needs_equipment_that_exists() {
    let h = Harness::new();
    let project = h.project("Riverside").await;
    let cement = h.material("Cement", 50, 5).await;

    let none = h
        .services
        .tasks
        .create_task_with_materials(NewTask::new(project, "Pour"), vec![line(cement, 1)], vec![])
        .await
        .unwrap_err();
    assert!(none.is_validation_error());

    let missing = h
        .services
        .tasks
        .create_task_with_materials(
            NewTask::new(project, "Pour"),
            vec![line(cement, 1)],
            vec![uses(EquipmentId::new())],
        )
        .await
        .unwrap_err();
    assert!(missing.is_not_found());
    assert_eq!(h.quantity(cement).await, dec(50));
}

#[tokio::test]
async fn test_unknown_references_are_not_found() {
    let h = Harness::new();
    let project = h.project("Riverside").await;
    let mixer = h.equipment("Mixer").await;

    let no_project = h
        .services
        .tasks
        .create_task_with_materials(
            NewTask::new(ProjectId::new(), "Pour"),
            vec![],
            vec![uses(mixer)],
        )
        .await
        .unwrap_err();
    assert!(no_project.is_not_found());

    let no_material = h
        .services
        .tasks
        .create_task_with_materials(
            NewTask::new(project, "Pour"),
            vec![line(MaterialId::new(), 1)],
            vec![uses(mixer)],
        )
        .await
        .unwrap_err();
    assert!(no_material.is_not_found());

    let mut input = NewTask::new(project, "Pour");
    input.assigned_to = Some(UserId::new());
    let no_user = h
        .services
        .tasks
        .create_task_with_materials(input, vec![], vec![uses(mixer)])
        .await
        .unwrap_err();
    assert!(no_user.is_not_found());
}

#[tokio::test]
async fn test_non_positive_quantity_is_rejected() {
    let h = Harness::new();
    let project = h.project("Riverside").await;
    let cement = h.material("Cement", 50, 5).await;
    let mixer = h.equipment("Mixer").await;

    let err = h
        .services
        .tasks
        .create_task_with_materials(
            NewTask::new(project, "Pour"),
            vec![line(cement, 0)],
            vec![uses(mixer)],
        )
        .await
        .unwrap_err();

    assert!(err.is_validation_error());
}

fn store_failing_task_insert() -> Store {
    let mut store = Store::in_memory();
    store.tasks = Arc::new(FailingRepository::new(store.tasks.clone(), Op::Insert, 0));
    store
}

#[tokio::test]
async fn test_compensating_mode_returns_reserved_stock() {
    let h = Harness::with_store(
        store_failing_task_insert(),
        CoreConfig::default().with_consistency(ConsistencyMode::Compensating),
    );
    let project = h.project("Riverside").await;
    let cement = h.material("Cement", 50, 5).await;
    let mixer = h.equipment("Mixer").await;

    let err = h
        .services
        .tasks
        .create_task_with_materials(
            NewTask::new(project, "Pour slab"),
            vec![line(cement, 20), line(cement, 5)],
            vec![uses(mixer)],
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    assert_eq!(h.quantity(cement).await, dec(50));
    let actions: Vec<_> = h
        .services
        .stock
        .stock_history(cement)
        .await
        .unwrap()
        .iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            StockAction::Used,
            StockAction::Used,
            StockAction::Returned,
            StockAction::Returned
        ]
    );
}

#[tokio::test]
async fn test_best_effort_mode_keeps_reservations() {
    let h = Harness::with_store(store_failing_task_insert(), CoreConfig::default());
    let project = h.project("Riverside").await;
    let cement = h.material("Cement", 50, 5).await;
    let mixer = h.equipment("Mixer").await;

    h.services
        .tasks
        .create_task_with_materials(
            NewTask::new(project, "Pour slab"),
            vec![line(cement, 20)],
            vec![uses(mixer)],
        )
        .await
        .unwrap_err();

    assert_eq!(h.quantity(cement).await, dec(30));
    assert!(h.services.projects.project_tasks(project).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_task_without_materials_touches_no_stock() {
    let h = Harness::new();
    let project = h.project("Riverside").await;
    let mixer = h.equipment("Mixer").await;

    let outcome = h
        .services
        .tasks
        .create_task_with_materials(NewTask::new(project, "Inspect"), vec![], vec![uses(mixer)])
        .await
        .unwrap();

    assert!(outcome.entity.materials().is_empty());
    assert_eq!(
        h.store.tasks.find_by_id(outcome.entity.id()).await.unwrap(),
        Some(outcome.entity)
    );
}
