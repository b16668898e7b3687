//! Place an order, reconcile its delivery and print the loss dashboard

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use procurement_core::utils::MemoryStorage;
use procurement_core::{Procurement, ProcurementConfig, ReconciliationRequest};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("📦 Procurement Core - Delivery Reconciliation Example\n");

    let config = ProcurementConfig::from_env()?;
    let mut procurement = Procurement::with_config(MemoryStorage::new(), config);

    // 1. Place an order
    println!("📝 Placing order...");
    let order = procurement
        .order_builder(
            "sup-001".to_string(),
            "Balkan Building Supply".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
        .item("Cement".to_string(), "kg".to_string(), BigDecimal::from(5), 10)
        .item("Floor tiles".to_string(), "m²".to_string(), BigDecimal::from(10), 5)
        .item("Rebar".to_string(), "pcs".to_string(), BigDecimal::from(100), 2)
        .build()?;
    let order = procurement.create_order(order).await?;

    println!("  ✓ {} for {}", order.order_number, order.supplier_name);
    for item in &order.items {
        println!(
            "    - {} x {} {} @ {}",
            item.name, item.quantity, item.unit, item.price
        );
    }
    println!("  Total: {}\n", order.total_amount);

    // 2. Count what arrived
    println!("🚚 Reconciling delivery...");
    let request = ReconciliationRequest::new(order.id.clone())
        .received(order.items[0].id.clone(), 8)
        .received(order.items[1].id.clone(), 5)
        .received(order.items[2].id.clone(), 0)
        .dated(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap())
        .notes("Rebar missing from truck");
    let reconciliation = procurement.reconcile(request).await?;

    for item in &reconciliation.outcome.items {
        println!(
            "    - {:<12} ordered {:>3}  received {:>3}  missing {:>3}  loss {:>8}  {}",
            item.name,
            item.ordered_qty,
            item.received_qty,
            item.missing_qty,
            item.loss_value,
            item.status
        );
    }
    println!("  Total loss: {}\n", reconciliation.total_loss_value());

    // 3. Trying again is refused
    let again = ReconciliationRequest::new(order.id.clone()).received(order.items[0].id.clone(), 10);
    match procurement.reconcile(again).await {
        Ok(_) => println!("  ✗ Second reconciliation unexpectedly accepted"),
        Err(e) => println!("  ✓ Second reconciliation refused: {}\n", e),
    }

    // 4. Dashboard
    println!("📊 Loss dashboard");
    let rate = procurement.loss_rate().await?;
    println!(
        "  Incidents: {}/{} ({:.0}%), average loss {}",
        rate.incidents_with_loss,
        rate.total_reconciled,
        rate.incidents_ratio * 100.0,
        rate.average_loss_per_incident
    );

    let top = procurement.top_items(None).await?;
    for item in &top.by_loss_value {
        println!(
            "  Worst item: {} ({}) lost {}",
            item.name, item.unit, item.total_loss_value
        );
    }

    println!("\n🧾 CSV export:");
    println!("{}", procurement.export_incidents_csv().await?);

    Ok(())
}
