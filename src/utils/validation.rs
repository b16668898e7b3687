//! Validation utilities

use bigdecimal::BigDecimal;
use std::collections::HashSet;

use crate::reconciliation::ReceivedQuantities;
use crate::types::*;

/// Validate that a price is not negative
pub fn validate_price(price: &BigDecimal) -> ProcurementResult<()> {
    if *price < BigDecimal::from(0) {
        Err(ProcurementError::Validation(
            "Price must be non-negative".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate a single order line item
pub fn validate_line_item(item: &OrderLineItem) -> ProcurementResult<()> {
    if item.name.trim().is_empty() {
        return Err(ProcurementError::Validation(
            "Item name is required".to_string(),
        ));
    }

    if item.unit.trim().is_empty() {
        return Err(ProcurementError::Validation(format!(
            "Unit is required for item '{}'",
            item.name
        )));
    }

    validate_price(&item.price)?;

    if item.quantity == 0 {
        return Err(ProcurementError::Validation(format!(
            "Quantity must be at least 1 for item '{}'",
            item.name
        )));
    }

    Ok(())
}

/// Validate an order before it is stored
pub fn validate_order(order: &Order) -> ProcurementResult<()> {
    if order.supplier_id.trim().is_empty() {
        return Err(ProcurementError::Validation(
            "Supplier ID cannot be empty".to_string(),
        ));
    }

    if order.order_number.trim().is_empty() {
        return Err(ProcurementError::Validation(
            "Order number cannot be empty".to_string(),
        ));
    }

    if order.items.is_empty() {
        return Err(ProcurementError::Validation(
            "At least one item is required".to_string(),
        ));
    }

    let mut ids = HashSet::new();
    for item in &order.items {
        validate_line_item(item)?;
        if !ids.insert(item.id.as_str()) {
            return Err(ProcurementError::Validation(format!(
                "Line item '{}' appears more than once",
                item.id
            )));
        }
    }

    Ok(())
}

/// Validate the shape of a reconciliation request
///
/// Runs before the order is loaded: order id present, at least one item,
/// no negative quantities, no line reported twice.
pub fn validate_reconciliation_request(request: &ReconciliationRequest) -> ProcurementResult<()> {
    if request.order_id.trim().is_empty() {
        return Err(ProcurementError::Validation(
            "Order ID cannot be empty".to_string(),
        ));
    }

    if request.items.is_empty() {
        return Err(ProcurementError::Validation(
            "At least one item with received quantity is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for item in &request.items {
        if item.order_item_id.trim().is_empty() {
            return Err(ProcurementError::Validation(
                "Order item ID cannot be empty".to_string(),
            ));
        }
        if item.received_qty < 0 {
            return Err(ProcurementError::Validation(format!(
                "Received quantity cannot be negative for item '{}'",
                item.order_item_id
            )));
        }
        if u32::try_from(item.received_qty).is_err() {
            return Err(ProcurementError::Validation(format!(
                "Received quantity is too large for item '{}'",
                item.order_item_id
            )));
        }
        if !seen.insert(item.order_item_id.as_str()) {
            return Err(ProcurementError::Validation(format!(
                "Item '{}' is reported more than once",
                item.order_item_id
            )));
        }
    }

    Ok(())
}

/// Match reported quantities against the order's line items
///
/// Every reported id must belong to the order. Lines without a report are
/// left out and read as received 0.
pub fn resolve_received_quantities(
    request: &ReconciliationRequest,
    order: &Order,
) -> ProcurementResult<ReceivedQuantities> {
    let mut received = ReceivedQuantities::new();

    for item in &request.items {
        if order.find_item(&item.order_item_id).is_none() {
            return Err(ProcurementError::Validation(format!(
                "Item '{}' is not part of order '{}'",
                item.order_item_id, order.order_number
            )));
        }
        let qty = u32::try_from(item.received_qty).map_err(|_| {
            ProcurementError::Validation(format!(
                "Received quantity {} is out of range for item '{}'",
                item.received_qty, item.order_item_id
            ))
        })?;
        received.insert(item.order_item_id.clone(), qty);
    }

    Ok(received)
}
