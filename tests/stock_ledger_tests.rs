// Copyright 2025 Cowboy AI, LLC.

//! Stock ledger behavior through the public service API

mod common;

use common::{dec, new_material, Harness};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use siteworks_domain::{
    Document, DomainError, ErrorKind, MaterialPatch, MaterialStatus, StockAction, StockUpdate,
};

#[tokio::test]
async fn test_stock_scenario_from_low_to_available_and_refused_reservation() {
    let h = Harness::new();
    let sand = h.material("Sand", 5, 10).await;
    assert_eq!(
        h.services.stock.get_material(sand).await.unwrap().status(),
        MaterialStatus::LowStock
    );

    let added = h
        .services
        .stock
        .update_stock(sand, StockUpdate::new(StockAction::Added, dec(50)))
        .await
        .unwrap();
    assert_eq!(added.entity.quantity(), dec(55));
    assert_eq!(added.entity.status(), MaterialStatus::Available);

    let used = h
        .services
        .stock
        .update_stock(sand, StockUpdate::new(StockAction::Used, dec(20)))
        .await
        .unwrap();
    assert_eq!(used.entity.quantity(), dec(35));

    let err = h
        .services
        .stock
        .reserve_for_task(sand, dec(100), None, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    let message = err.to_string();
    assert!(message.contains("35"), "{message}");
    assert!(message.contains("100"), "{message}");

    let after = h.services.stock.get_material(sand).await.unwrap();
    assert_eq!(after.quantity(), dec(35));
    assert_eq!(after.stock_history().len(), 2);
}

#[tokio::test]
async fn test_used_beyond_stock_clamps_to_zero() {
    let h = Harness::new();
    let gravel = h.material("Gravel", 35, 10).await;

    let outcome = h
        .services
        .stock
        .update_stock(gravel, StockUpdate::new(StockAction::Used, dec(100)))
        .await
        .unwrap();

    assert_eq!(outcome.entity.quantity(), dec(0));
    assert_eq!(outcome.entity.status(), MaterialStatus::OutOfStock);
    let entry = outcome.entity.stock_history().last().cloned().unwrap();
    assert_eq!(entry.previous_stock, dec(35));
    assert_eq!(entry.new_stock, dec(0));
}

#[tokio::test]
async fn test_addition_beyond_decimal_range_is_rejected() {
    let h = Harness::new();
    let sand = h.material("Sand", 10, 1).await;

    for action in [StockAction::Added, StockAction::Returned] {
        let err = h
            .services
            .stock
            .update_stock(sand, StockUpdate::new(action, Decimal::MAX))
            .await
            .unwrap_err();
        assert!(err.is_validation_error(), "{err}");
    }

    let after = h.services.stock.get_material(sand).await.unwrap();
    assert_eq!(after.quantity(), dec(10));
    assert!(after.stock_history().is_empty());
    assert_eq!(after.version(), 1);
}

#[tokio::test]
async fn test_reserve_records_project_and_note() {
    let h = Harness::new();
    let project = h.project("Bridge").await;
    let foreman = h.user("Avery").await;
    let rebar = h.material("Rebar", 40, 5).await;

    let outcome = h
        .services
        .stock
        .reserve_for_task(rebar, dec(15), Some(project), Some(foreman))
        .await
        .unwrap();

    let entry = &outcome.entity.stock_history()[0];
    assert_eq!(entry.action, StockAction::Used);
    assert_eq!(entry.project, Some(project));
    assert_eq!(entry.updated_by, Some(foreman));
    assert_eq!(entry.notes.as_deref(), Some("Reserved for task"));
    assert_eq!(outcome.entity.quantity(), dec(25));
}

#[tokio::test]
async fn test_adjusted_twice_keeps_quantity_and_both_entries() {
    let h = Harness::new();
    let tiles = h.material("Tiles", 12, 3).await;

    for _ in 0..2 {
        let outcome = h
            .services
            .stock
            .update_stock(tiles, StockUpdate::new(StockAction::Adjusted, dec(30)))
            .await
            .unwrap();
        assert_eq!(outcome.entity.quantity(), dec(30));
    }

    let history = h.services.stock.stock_history(tiles).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].previous_stock, dec(30));
}

#[tokio::test]
async fn test_unknown_action_string_is_invalid_action() {
    let err = "Stolen".parse::<StockAction>().unwrap_err();
    assert_eq!(
        err,
        DomainError::InvalidAction {
            action: "Stolen".into()
        }
    );
}

#[tokio::test]
async fn test_negative_quantity_is_rejected_without_change() {
    let h = Harness::new();
    let sand = h.material("Sand", 8, 2).await;

    let err = h
        .services
        .stock
        .update_stock(sand, StockUpdate::new(StockAction::Added, dec(-3)))
        .await
        .unwrap_err();

    assert!(err.is_validation_error());
    assert_eq!(h.quantity(sand).await, dec(8));
}

#[tokio::test]
async fn test_codes_are_generated_in_sequence_and_explicit_codes_kept() {
    let h = Harness::new();
    let first = h.services.stock.create_material(new_material("A", 1, 0)).await.unwrap();
    let second = h.services.stock.create_material(new_material("B", 1, 0)).await.unwrap();
    let mut explicit = new_material("C", 1, 0);
    explicit.code = Some("cem-01".into());
    let third = h.services.stock.create_material(explicit).await.unwrap();

    assert_eq!(first.entity.code, "MAT-00001");
    assert_eq!(second.entity.code, "MAT-00002");
    assert_eq!(third.entity.code, "CEM-01");

    let mut clash = new_material("D", 1, 0);
    clash.code = Some("CEM-01".into());
    let err = h.services.stock.create_material(clash).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateKey);
}

#[tokio::test]
async fn test_generated_codes_skip_codes_taken_explicitly() {
    let h = Harness::new();
    let mut explicit = new_material("Cement", 1, 0);
    explicit.code = Some("mat-00001".into());
    h.services.stock.create_material(explicit).await.unwrap();

    let generated = h
        .services
        .stock
        .create_material(new_material("Sand", 1, 0))
        .await
        .unwrap();

    assert_eq!(generated.entity.code, "MAT-00002");
    assert_eq!(h.store.materials.find_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_discontinued_is_replaced_on_next_stock_update() {
    let h = Harness::new();
    let paint = h.material("Paint", 20, 5).await;

    let patched = h
        .services
        .stock
        .update_material(
            paint,
            MaterialPatch {
                discontinued: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(patched.entity.status(), MaterialStatus::Discontinued);

    let outcome = h
        .services
        .stock
        .update_stock(paint, StockUpdate::new(StockAction::Used, dec(1)))
        .await
        .unwrap();
    assert_eq!(outcome.entity.status(), MaterialStatus::Available);
}

#[tokio::test]
async fn test_low_stock_lists_emptiest_first() {
    let h = Harness::new();
    let low = h.material("Low", 4, 10).await;
    let empty = h.material("Empty", 0, 10).await;
    h.material("Plenty", 100, 10).await;

    let listed: Vec<_> = h
        .services
        .stock
        .low_stock_materials()
        .await
        .unwrap()
        .iter()
        .map(|m| m.id())
        .collect();

    assert_eq!(listed, vec![empty, low]);
}

#[tokio::test]
async fn test_stock_update_notifies_materials_topic() {
    let h = Harness::new();
    let sand = h.material("Sand", 5, 1).await;

    h.services
        .stock
        .update_stock(sand, StockUpdate::new(StockAction::Returned, dec(2)))
        .await
        .unwrap();

    assert_eq!(h.sink.event_types(), vec!["MaterialCreated", "StockUpdated"]);
    let last = h.sink.on_topic("materials").pop().unwrap();
    assert_eq!(last.payload["event"]["entry"]["action"], "Returned");
    assert_eq!(last.payload["data"]["code"], "MAT-00001");
}

#[tokio::test]
async fn test_delete_unknown_material_is_not_found() {
    let h = Harness::new();
    let sand = h.material("Sand", 5, 1).await;
    h.services.stock.delete_material(sand).await.unwrap();

    let err = h.services.stock.delete_material(sand).await.unwrap_err();
    assert!(err.is_not_found());
}
