//! Core types and data structures for the procurement system

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an order
///
/// Orders move linearly `Pending -> Delivered -> Reconciled`; the delivered
/// step is optional, so `Pending -> Reconciled` is also allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed with the supplier, nothing received yet
    Pending,
    /// Goods arrived but have not been counted
    Delivered,
    /// Received quantities were compared against the order
    Reconciled,
}

impl OrderStatus {
    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Delivered)
                | (OrderStatus::Pending, OrderStatus::Reconciled)
                | (OrderStatus::Delivered, OrderStatus::Reconciled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Reconciled => "RECONCILED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery outcome of a single order line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineItemStatus {
    /// Received exactly what was ordered
    Complete,
    /// Received less than ordered
    Missing,
    /// Received more than ordered
    Excess,
}

impl LineItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemStatus::Complete => "COMPLETE",
            LineItemStatus::Missing => "MISSING",
            LineItemStatus::Excess => "EXCESS",
        }
    }
}

impl fmt::Display for LineItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One product entry within an order, frozen at order creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    /// Unique identifier within the order
    pub id: String,
    /// Catalog product this line was taken from, if any
    pub product_id: Option<String>,
    /// Display name snapshot
    pub name: String,
    /// Free-text unit of measure ("kg", "ton", "m²", ...)
    pub unit: String,
    /// Unit price snapshot
    pub price: BigDecimal,
    /// Ordered quantity
    pub quantity: u32,
}

impl OrderLineItem {
    /// Create a new line item with a generated identifier
    pub fn new(
        product_id: Option<String>,
        name: String,
        unit: String,
        price: BigDecimal,
        quantity: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            product_id,
            name,
            unit,
            price,
            quantity,
        }
    }

    /// Price multiplied by ordered quantity
    pub fn line_total(&self) -> BigDecimal {
        &self.price * BigDecimal::from(self.quantity)
    }
}

/// Purchase order placed with a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Human-facing number, e.g. `ORD-7K2M9X0QPA`
    pub order_number: String,
    pub order_date: NaiveDate,
    pub supplier_id: String,
    /// Supplier name at the time the order was placed
    pub supplier_name: String,
    /// Sum of all line totals
    pub total_amount: BigDecimal,
    pub status: OrderStatus,
    pub notes: Option<String>,
    /// Line items in the order they were added
    pub items: Vec<OrderLineItem>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Order {
    /// Create a new pending order without items
    pub fn new(
        order_number: String,
        order_date: NaiveDate,
        supplier_id: String,
        supplier_name: String,
        notes: Option<String>,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            order_number,
            order_date,
            supplier_id,
            supplier_name,
            total_amount: BigDecimal::from(0),
            status: OrderStatus::Pending,
            notes,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a line item and refresh the order total
    pub fn add_item(&mut self, item: OrderLineItem) {
        self.items.push(item);
        self.total_amount = self.items.iter().map(|i| i.line_total()).sum();
        self.updated_at = chrono::Utc::now().naive_utc();
    }

    /// Look up a line item by its identifier
    pub fn find_item(&self, item_id: &str) -> Option<&OrderLineItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn is_reconciled(&self) -> bool {
        self.status == OrderStatus::Reconciled
    }
}

/// Criteria for listing orders; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub supplier_id: Option<String>,
    /// Inclusive lower bound on the order date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the order date
    pub to: Option<NaiveDate>,
    /// Case-insensitive match against supplier name or order number
    pub search: Option<String>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        if self.status.is_some_and(|s| s != order.status) {
            return false;
        }
        if self
            .supplier_id
            .as_ref()
            .is_some_and(|id| id != &order.supplier_id)
        {
            return false;
        }
        if self.from.is_some_and(|from| order.order_date < from) {
            return false;
        }
        if self.to.is_some_and(|to| order.order_date > to) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                order.supplier_name.to_lowercase().contains(&q)
                    || order.order_number.to_lowercase().contains(&q)
            }
            _ => true,
        }
    }
}

/// Spend summary over a set of orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub total_spend: BigDecimal,
    pub total_count: usize,
}

/// Reported quantity for one line item, as received at the boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedItem {
    pub order_item_id: String,
    /// Signed so that negative reports can be rejected rather than wrapped
    pub received_qty: i64,
}

/// Input document for reconciling an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationRequest {
    pub order_id: String,
    /// Defaults to today when absent
    #[serde(default)]
    pub reconciliation_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<ReceivedItem>,
}

impl ReconciliationRequest {
    pub fn new(order_id: String) -> Self {
        Self {
            order_id,
            reconciliation_date: None,
            notes: None,
            items: Vec::new(),
        }
    }

    /// Report a received quantity for a line item
    pub fn received(mut self, order_item_id: impl Into<String>, received_qty: i64) -> Self {
        self.items.push(ReceivedItem {
            order_item_id: order_item_id.into(),
            received_qty,
        });
        self
    }

    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.reconciliation_date = Some(date);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Result of comparing one ordered line against its received quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemOutcome {
    pub missing_qty: u32,
    pub loss_value: BigDecimal,
    pub status: LineItemStatus,
}

/// Per-line result of a reconciliation, with a frozen copy of the line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationItem {
    pub order_item_id: String,
    pub name: String,
    pub unit: String,
    pub price: BigDecimal,
    pub ordered_qty: u32,
    pub received_qty: u32,
    pub missing_qty: u32,
    pub loss_value: BigDecimal,
    pub status: LineItemStatus,
}

/// Output document of the reconciliation engine, not yet persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationOutcome {
    pub order_id: String,
    pub reconciliation_date: NaiveDate,
    pub notes: Option<String>,
    pub total_loss_value: BigDecimal,
    /// One entry per order line item, in order-item sequence
    pub items: Vec<ReconciliationItem>,
}

impl ReconciliationOutcome {
    /// Whether any line was short-delivered
    pub fn has_losses(&self) -> bool {
        self.total_loss_value > BigDecimal::from(0)
    }

    pub fn total_missing_qty(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.missing_qty)).sum()
    }
}

/// Persisted reconciliation record, created once per order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub id: String,
    #[serde(flatten)]
    pub outcome: ReconciliationOutcome,
    pub created_at: NaiveDateTime,
}

impl Reconciliation {
    /// Wrap an engine outcome into a record ready for storage
    pub fn new(outcome: ReconciliationOutcome) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            outcome,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn order_id(&self) -> &str {
        &self.outcome.order_id
    }

    pub fn total_loss_value(&self) -> &BigDecimal {
        &self.outcome.total_loss_value
    }

    pub fn has_losses(&self) -> bool {
        self.outcome.has_losses()
    }
}

/// Errors that can occur in the procurement system
#[derive(Debug, thiserror::Error)]
pub enum ProcurementError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Order not found: {0}")]
    OrderNotFound(String),
    #[error("Reconciliation not found: {0}")]
    ReconciliationNotFound(String),
    #[error("Order already reconciled: {0}")]
    AlreadyReconciled(String),
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },
    #[error("Export error: {0}")]
    Export(String),
}

/// Result type for procurement operations
pub type ProcurementResult<T> = Result<T, ProcurementError>;
