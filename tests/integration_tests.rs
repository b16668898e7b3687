//! Integration tests for procurement-core

use procurement_core::{
    compute_line_item, utils::MemoryStorage, LineItemStatus, OrderFilter, OrderStatus,
    Procurement, ProcurementError, ProcurementStorage, ReconciliationEngine,
    ReconciliationRequest,
};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

#[test]
fn test_line_item_scenarios() {
    let price = BigDecimal::from(5);

    let short = compute_line_item(10, 8, &price);
    assert_eq!(
        (short.missing_qty, short.loss_value, short.status),
        (2, BigDecimal::from(10), LineItemStatus::Missing)
    );

    let exact = compute_line_item(10, 10, &price);
    assert_eq!(
        (exact.missing_qty, exact.loss_value, exact.status),
        (0, BigDecimal::from(0), LineItemStatus::Complete)
    );

    let over = compute_line_item(10, 12, &price);
    assert_eq!(
        (over.missing_qty, over.loss_value, over.status),
        (0, BigDecimal::from(0), LineItemStatus::Excess)
    );

    let none = compute_line_item(10, 0, &price);
    assert_eq!(
        (none.missing_qty, none.loss_value, none.status),
        (10, BigDecimal::from(50), LineItemStatus::Missing)
    );
}

#[tokio::test]
async fn test_complete_reconciliation_workflow() {
    let storage = MemoryStorage::new();
    let mut procurement = Procurement::new(storage.clone());

    let order = procurement
        .order_builder("sup-1".to_string(), "Acme Supply".to_string(), date(3, 1))
        .notes("Site B".to_string())
        .item("Cement".to_string(), "kg".to_string(), BigDecimal::from(5), 10)
        .item("Tiles".to_string(), "m²".to_string(), BigDecimal::from(10), 5)
        .item("Rebar".to_string(), "pcs".to_string(), BigDecimal::from(100), 2)
        .build()
        .unwrap();
    let order = procurement.create_order(order).await.unwrap();
    assert_eq!(order.total_amount, BigDecimal::from(300));

    procurement
        .update_order_status(&order.id, OrderStatus::Delivered)
        .await
        .unwrap();

    // Rebar is left out of the report and counts as nothing received.
    let request = ReconciliationRequest::new(order.id.clone())
        .received(order.items[0].id.clone(), 8)
        .received(order.items[1].id.clone(), 5)
        .dated(date(3, 4))
        .notes("one pallet damaged");
    let reconciliation = procurement.reconcile(request).await.unwrap();

    let losses: Vec<BigDecimal> = reconciliation
        .outcome
        .items
        .iter()
        .map(|i| i.loss_value.clone())
        .collect();
    assert_eq!(
        losses,
        vec![
            BigDecimal::from(10),
            BigDecimal::from(0),
            BigDecimal::from(200)
        ]
    );
    assert_eq!(*reconciliation.total_loss_value(), BigDecimal::from(210));
    let statuses: Vec<LineItemStatus> = reconciliation
        .outcome
        .items
        .iter()
        .map(|i| i.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            LineItemStatus::Missing,
            LineItemStatus::Complete,
            LineItemStatus::Missing
        ]
    );

    let stored = storage.get_order(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Reconciled);

    // A second attempt is rejected and leaves the first record untouched.
    let again = ReconciliationRequest::new(order.id.clone()).received(order.items[0].id.clone(), 10);
    let err = procurement.reconcile(again).await.unwrap_err();
    assert!(matches!(err, ProcurementError::AlreadyReconciled(_)));

    let kept = procurement
        .get_order_reconciliation(&order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept, reconciliation);
    assert_eq!(procurement.list_reconciliations().await.unwrap().len(), 1);

    let csv = procurement.export_incidents_csv().await.unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].ends_with(r#""Cement","kg","10","8","2","10.00","one pallet damaged""#));
    assert!(rows[2].ends_with(r#""Rebar","pcs","2","0","2","200.00","one pallet damaged""#));
}

#[tokio::test]
async fn test_dashboard_analytics() {
    let mut procurement = Procurement::new(MemoryStorage::new());

    let mut placed = Vec::new();
    for (day, supplier) in [(2, "North"), (10, "South"), (20, "North")] {
        let order = procurement
            .order_builder(format!("sup-{supplier}"), supplier.to_string(), date(2, day))
            .item("Sand".to_string(), "ton".to_string(), BigDecimal::from(40), 5)
            .build()
            .unwrap();
        placed.push(procurement.create_order(order).await.unwrap());
    }

    for (order, received, recon_date) in [
        (&placed[0], 3, date(2, 5)),
        (&placed[1], 5, date(3, 12)),
        (&placed[2], 4, date(4, 1)),
    ] {
        procurement
            .reconcile(
                ReconciliationRequest::new(order.id.clone())
                    .received(order.items[0].id.clone(), received)
                    .dated(recon_date),
            )
            .await
            .unwrap();
    }

    let overview = procurement.loss_overview().await.unwrap();
    assert_eq!(overview.total_losses, BigDecimal::from(120));
    assert_eq!(overview.pending_orders, 0);
    assert_eq!(overview.reconciled_orders, 3);

    let months = procurement.monthly_loss(Some(3), date(4, 30)).await.unwrap();
    let totals: Vec<(&str, BigDecimal)> = months
        .iter()
        .map(|m| (m.month.as_str(), m.total.clone()))
        .collect();
    assert_eq!(
        totals,
        vec![
            ("2024-02", BigDecimal::from(80)),
            ("2024-03", BigDecimal::from(0)),
            ("2024-04", BigDecimal::from(40)),
        ]
    );

    let rate = procurement.loss_rate().await.unwrap();
    assert_eq!(rate.incidents_with_loss, 2);
    assert_eq!(rate.total_reconciled, 3);
    assert_eq!(rate.average_loss_per_incident, BigDecimal::from(60));

    let top = procurement.top_items(None).await.unwrap();
    assert_eq!(top.by_loss_value.len(), 1);
    assert_eq!(top.by_loss_value[0].total_missing_qty, 3);

    let summary = procurement.control_summary().await.unwrap();
    assert_eq!(summary.incident_count, 2);
    assert_eq!(summary.total_items_missing, 3);

    let recent = procurement.recent_reconciliations(Some(1), false).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].order_id(), placed[2].id);

    let with_losses = procurement
        .recent_reconciliations(Some(50), true)
        .await
        .unwrap();
    assert_eq!(with_losses.len(), 2);

    let north = procurement
        .list_orders(&OrderFilter {
            search: Some("north".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(north.len(), 2);
    assert_eq!(north[0].order_date, date(2, 20));
}

#[tokio::test]
async fn test_boundary_rejections() {
    let mut procurement = Procurement::new(MemoryStorage::new());
    let order = procurement
        .order_builder("sup-1".to_string(), "Acme".to_string(), date(5, 1))
        .item("Glass".to_string(), "m²".to_string(), BigDecimal::from(25), 4)
        .build()
        .unwrap();
    let order = procurement.create_order(order).await.unwrap();
    let item_id = order.items[0].id.clone();

    let negative = ReconciliationRequest::new(order.id.clone()).received(item_id.clone(), -2);
    assert!(matches!(
        procurement.reconcile(negative).await,
        Err(ProcurementError::Validation(_))
    ));

    let stranger = ReconciliationRequest::new(order.id.clone()).received("not-in-order", 1);
    assert!(matches!(
        procurement.reconcile(stranger).await,
        Err(ProcurementError::Validation(_))
    ));

    let unknown_order = ReconciliationRequest::new("missing".to_string()).received(item_id.clone(), 1);
    assert!(matches!(
        procurement.reconcile(unknown_order).await,
        Err(ProcurementError::OrderNotFound(_))
    ));

    let manual = procurement
        .update_order_status(&order.id, OrderStatus::Reconciled)
        .await;
    assert!(matches!(
        manual,
        Err(ProcurementError::InvalidStatusTransition { .. })
    ));

    // None of the rejected attempts consumed the order's single reconciliation.
    let engine = ReconciliationEngine::new().with_price_override(item_id.clone(), BigDecimal::from(30));
    let reconciliation = procurement
        .reconcile_with(
            ReconciliationRequest::new(order.id.clone()).received(item_id, 1),
            &engine,
        )
        .await
        .unwrap();
    assert_eq!(*reconciliation.total_loss_value(), BigDecimal::from(90));
    assert!(procurement.validate_integrity().await.unwrap().is_valid);
}
