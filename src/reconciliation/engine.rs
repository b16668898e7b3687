//! Pure ordered-versus-received computation
//!
//! Nothing here touches storage or the clock: the reconciliation date is
//! always supplied by the caller.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::trace;

use crate::types::*;

/// Received quantities keyed by order line item id; absent ids read as 0
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceivedQuantities(HashMap<String, u32>);

impl ReceivedQuantities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, order_item_id: impl Into<String>, received_qty: u32) {
        self.0.insert(order_item_id.into(), received_qty);
    }

    /// Reported quantity for a line, or 0 when nothing was reported
    pub fn get(&self, order_item_id: &str) -> u32 {
        self.0.get(order_item_id).copied().unwrap_or(0)
    }
}

impl<K: Into<String>> FromIterator<(K, u32)> for ReceivedQuantities {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Unit prices that replace the snapshot price for specific line items
pub type PriceOverrides = HashMap<String, BigDecimal>;

/// Classify one line and value its shortfall
///
/// `missing_qty = max(ordered - received, 0)` and
/// `loss_value = missing_qty * unit_price`. Status precedence is
/// MISSING, then EXCESS, then COMPLETE.
pub fn compute_line_item(
    ordered_qty: u32,
    received_qty: u32,
    unit_price: &BigDecimal,
) -> LineItemOutcome {
    let missing_qty = ordered_qty.saturating_sub(received_qty);
    let loss_value = BigDecimal::from(missing_qty) * unit_price;
    let status = if missing_qty > 0 {
        LineItemStatus::Missing
    } else if received_qty > ordered_qty {
        LineItemStatus::Excess
    } else {
        LineItemStatus::Complete
    };

    LineItemOutcome {
        missing_qty,
        loss_value,
        status,
    }
}

/// Reconcile every line of an order against the reported quantities
///
/// Produces exactly one item per input line, in input order. Name, unit and
/// price are copied from the line items so the result stays a historical
/// snapshot.
pub fn compute_reconciliation(
    order_id: &str,
    line_items: &[OrderLineItem],
    received: &ReceivedQuantities,
    price_overrides: Option<&PriceOverrides>,
    reconciliation_date: NaiveDate,
    notes: Option<String>,
) -> ReconciliationOutcome {
    let mut items = Vec::with_capacity(line_items.len());
    let mut total_loss_value = BigDecimal::from(0);

    for line in line_items {
        let price = price_overrides
            .and_then(|overrides| overrides.get(&line.id))
            .unwrap_or(&line.price);
        let received_qty = received.get(&line.id);
        let outcome = compute_line_item(line.quantity, received_qty, price);

        trace!(
            order_item_id = %line.id,
            ordered_qty = line.quantity,
            received_qty,
            missing_qty = outcome.missing_qty,
            status = %outcome.status,
            "reconciled line item"
        );

        total_loss_value += &outcome.loss_value;
        items.push(ReconciliationItem {
            order_item_id: line.id.clone(),
            name: line.name.clone(),
            unit: line.unit.clone(),
            price: price.clone(),
            ordered_qty: line.quantity,
            received_qty,
            missing_qty: outcome.missing_qty,
            loss_value: outcome.loss_value,
            status: outcome.status,
        });
    }

    ReconciliationOutcome {
        order_id: order_id.to_string(),
        reconciliation_date,
        notes,
        total_loss_value,
        items,
    }
}

/// Re-derive every stored value and describe each disagreement
pub fn verify_outcome(outcome: &ReconciliationOutcome) -> Vec<String> {
    let mut issues = Vec::new();

    for item in &outcome.items {
        let expected = compute_line_item(item.ordered_qty, item.received_qty, &item.price);
        if expected.missing_qty != item.missing_qty {
            issues.push(format!(
                "Item '{}' has missing quantity {}, expected {}",
                item.order_item_id, item.missing_qty, expected.missing_qty
            ));
        }
        if expected.loss_value != item.loss_value {
            issues.push(format!(
                "Item '{}' has loss value {}, expected {}",
                item.order_item_id, item.loss_value, expected.loss_value
            ));
        }
        if expected.status != item.status {
            issues.push(format!(
                "Item '{}' has status {}, expected {}",
                item.order_item_id, item.status, expected.status
            ));
        }
    }

    let item_total: BigDecimal = outcome.items.iter().map(|i| &i.loss_value).sum();
    if item_total != outcome.total_loss_value {
        issues.push(format!(
            "Total loss value is {}, items sum to {}",
            outcome.total_loss_value, item_total
        ));
    }

    issues
}

/// Engine configured with optional per-item price overrides
#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    price_overrides: PriceOverrides,
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value losses for `order_item_id` at `price` instead of its snapshot price
    pub fn with_price_override(mut self, order_item_id: impl Into<String>, price: BigDecimal) -> Self {
        self.price_overrides.insert(order_item_id.into(), price);
        self
    }

    /// Reconcile an order's line items
    pub fn reconcile(
        &self,
        order: &Order,
        received: &ReceivedQuantities,
        reconciliation_date: NaiveDate,
        notes: Option<String>,
    ) -> ReconciliationOutcome {
        let overrides = (!self.price_overrides.is_empty()).then_some(&self.price_overrides);
        compute_reconciliation(
            &order.id,
            &order.items,
            received,
            overrides,
            reconciliation_date,
            notes,
        )
    }
}
