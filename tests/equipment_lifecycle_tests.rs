// Copyright 2025 Cowboy AI, LLC.

//! Equipment assignment, return, overrides and the maintenance schedule

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{dec, Harness};
use pretty_assertions::assert_eq;
use siteworks_domain::{
    AdministrativeStatus, CoreConfig, Document, DomainEvent, EquipmentCondition, EquipmentPatch,
    EquipmentStatus, ErrorKind, MaintenanceRequest, NewEquipment, ProjectId, UserId,
};

fn service(scheduled_date: chrono::DateTime<Utc>) -> MaintenanceRequest {
    MaintenanceRequest {
        maintenance_type: "service".into(),
        description: "oil and filters".into(),
        scheduled_date,
        cost: Some(dec(250)),
        performed_by: "Workshop".into(),
    }
}

#[tokio::test]
async fn test_assign_then_return_restores_availability() {
    let h = Harness::new();
    let project = h.project("Depot").await;
    let operator = h.user("Quinn").await;
    let crane = h.equipment("Crane").await;

    let assigned = h
        .services
        .equipment
        .assign(crane, project, operator, Some("north yard".into()))
        .await
        .unwrap();
    assert_eq!(assigned.entity.status(), EquipmentStatus::InUse);
    assert_eq!(assigned.entity.current_project(), Some(project));
    assert_eq!(assigned.entity.assigned_to(), Some(operator));

    let returned = h
        .services
        .equipment
        .return_equipment(crane, dec(6), Some(EquipmentCondition::Fair), None)
        .await
        .unwrap();
    let unit = returned.entity;
    assert_eq!(unit.status(), EquipmentStatus::Available);
    assert_eq!(unit.current_project(), None);
    assert_eq!(unit.assigned_to(), None);
    assert_eq!(unit.condition(), EquipmentCondition::Fair);

    assert_eq!(unit.usage_history().len(), 1);
    let record = &unit.usage_history()[0];
    assert!(record.end_date.is_some());
    assert_eq!(record.hours_used, Some(dec(6)));
    assert_eq!(record.condition, Some(EquipmentCondition::Fair));
    assert_eq!(record.notes.as_deref(), Some("north yard"));
}

#[tokio::test]
async fn test_assign_in_use_fails_and_leaves_unit_unchanged() {
    let h = Harness::new();
    let first = h.project("First").await;
    let second = h.project("Second").await;
    let operator = h.user("Quinn").await;
    let crane = h.equipment("Crane").await;
    h.services
        .equipment
        .assign(crane, first, operator, None)
        .await
        .unwrap();
    let before = h.services.equipment.get_equipment(crane).await.unwrap();

    let err = h
        .services
        .equipment
        .assign(crane, second, operator, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AlreadyInUse);
    assert_eq!(h.services.equipment.get_equipment(crane).await.unwrap(), before);
}

#[tokio::test]
async fn test_return_when_available_is_not_in_use() {
    let h = Harness::new();
    let crane = h.equipment("Crane").await;

    let err = h
        .services
        .equipment
        .return_equipment(crane, dec(1), None, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotInUse);
}

#[tokio::test]
async fn test_assign_requires_existing_project_and_user() {
    let h = Harness::new();
    let project = h.project("Depot").await;
    let operator = h.user("Quinn").await;
    let crane = h.equipment("Crane").await;

    let missing_project = h
        .services
        .equipment
        .assign(crane, ProjectId::new(), operator, None)
        .await
        .unwrap_err();
    let missing_user = h
        .services
        .equipment
        .assign(crane, project, UserId::new(), None)
        .await
        .unwrap_err();

    assert!(missing_project.is_not_found());
    assert!(missing_user.is_not_found());
    assert_eq!(
        h.services.equipment.get_equipment(crane).await.unwrap().status(),
        EquipmentStatus::Available
    );
}

#[tokio::test]
async fn test_override_out_of_use_closes_the_open_record() {
    let h = Harness::new();
    let project = h.project("Depot").await;
    let operator = h.user("Quinn").await;
    let loader = h.equipment("Loader").await;
    h.services
        .equipment
        .assign(loader, project, operator, None)
        .await
        .unwrap();

    let outcome = h
        .services
        .equipment
        .override_status(loader, AdministrativeStatus::UnderMaintenance)
        .await
        .unwrap();

    assert_eq!(outcome.entity.status(), EquipmentStatus::UnderMaintenance);
    assert_eq!(outcome.entity.current_project(), None);
    assert!(outcome.entity.usage_history()[0].end_date.is_some());
    assert_eq!(outcome.event.event_type(), "EquipmentStatusOverridden");
}

#[tokio::test]
async fn test_patch_cannot_reach_status() {
    let h = Harness::new();
    let loader = h.equipment("Loader").await;

    let outcome = h
        .services
        .equipment
        .update_equipment(
            loader,
            EquipmentPatch {
                model: Some("L-200".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.entity.model.as_deref(), Some("L-200"));
    assert_eq!(outcome.entity.status(), EquipmentStatus::Available);
}

#[tokio::test]
async fn test_schedule_maintenance_stamps_dates_at_scheduling_time() {
    let h = Harness::new();
    let mixer = h.equipment("Mixer").await;
    let due = Utc::now() + Duration::days(30);

    let outcome = h
        .services
        .equipment
        .schedule_maintenance(mixer, service(due))
        .await
        .unwrap();

    let unit = outcome.entity;
    assert_eq!(unit.next_maintenance_date(), Some(due));
    assert!(unit.last_maintenance_date().is_some());
    assert_eq!(unit.maintenance_history().len(), 1);
    assert_eq!(unit.maintenance_history()[0].cost, Some(dec(250)));
}

#[tokio::test]
async fn test_maintenance_schedule_buckets_and_orders_by_due_date() {
    let h = Harness::with_config(CoreConfig::default().with_maintenance_due_soon_days(7));
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();

    let late = h.equipment("Late").await;
    let soon = h.equipment("Soon").await;
    let sooner = h.equipment("Sooner").await;
    let later = h.equipment("Later").await;
    h.equipment("Never scheduled").await;

    for (unit, offset) in [
        (late, -Duration::days(2)),
        (soon, Duration::days(7)),
        (sooner, Duration::hours(20)),
        (later, Duration::days(8)),
    ] {
        h.services
            .equipment
            .schedule_maintenance(unit, service(now + offset))
            .await
            .unwrap();
    }

    let schedule = h.services.equipment.maintenance_schedule_at(now).await.unwrap();

    let ids = |entries: &[siteworks_domain::MaintenanceEntry]| {
        entries.iter().map(|e| e.equipment).collect::<Vec<_>>()
    };
    assert_eq!(ids(&schedule.overdue), vec![late]);
    assert_eq!(ids(&schedule.due_soon), vec![sooner, soon]);
    assert_eq!(ids(&schedule.scheduled), vec![later]);
    assert_eq!(schedule.overdue[0].days_until_due, -2);
    assert_eq!(schedule.due_soon[0].days_until_due, 1);
    assert_eq!(schedule.scheduled[0].days_until_due, 8);
}

#[tokio::test]
async fn test_available_equipment_excludes_assigned_units() {
    let h = Harness::new();
    let project = h.project("Depot").await;
    let operator = h.user("Quinn").await;
    let busy = h.equipment("Busy").await;
    let idle = h.equipment("Idle").await;
    h.services
        .equipment
        .assign(busy, project, operator, None)
        .await
        .unwrap();

    let available: Vec<_> = h
        .services
        .equipment
        .available_equipment()
        .await
        .unwrap()
        .iter()
        .map(|e| e.id())
        .collect();

    assert_eq!(available, vec![idle]);
}

#[tokio::test]
async fn test_equipment_codes_use_their_own_sequence() {
    let h = Harness::new();
    h.material("Sand", 1, 0).await;
    let first = h.equipment("Crane").await;

    let unit = h.services.equipment.get_equipment(first).await.unwrap();
    assert_eq!(unit.code, "EQ-00001");
}

#[tokio::test]
async fn test_generated_equipment_code_skips_explicit_one() {
    let h = Harness::new();
    h.services
        .equipment
        .create_equipment(NewEquipment {
            name: "Tower crane".into(),
            equipment_type: "plant".into(),
            code: Some("EQ-00001".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    let crane = h.equipment("Mobile crane").await;

    let unit = h.services.equipment.get_equipment(crane).await.unwrap();
    assert_eq!(unit.code, "EQ-00002");
}
