//! Order placement and status management

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::traits::*;
use crate::types::*;

/// Default prefix for generated order numbers
pub const DEFAULT_ORDER_NUMBER_PREFIX: &str = "ORD-";

/// Default count of random characters in generated order numbers
pub const DEFAULT_ORDER_NUMBER_LENGTH: usize = 10;

/// Generate an order number such as `ORD-3F9A0C71BE`
///
/// `length` is capped at 32, the width of a hex-encoded v4 uuid.
pub fn generate_order_number(prefix: &str, length: usize) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    let take = length.min(random.len());
    format!("{}{}", prefix, &random[..take])
}

/// Total spend and count over a set of orders
pub fn summarize_orders(orders: &[Order]) -> OrderSummary {
    OrderSummary {
        total_spend: orders.iter().map(|o| &o.total_amount).sum(),
        total_count: orders.len(),
    }
}

/// Order manager for handling order operations
pub struct OrderManager<S: ProcurementStorage> {
    pub(crate) storage: S,
    validator: Box<dyn OrderValidator>,
}

impl<S: ProcurementStorage> OrderManager<S> {
    /// Create a new order manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultOrderValidator),
        }
    }

    /// Create a new order manager with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn OrderValidator>) -> Self {
        Self { storage, validator }
    }

    /// Store a newly placed order
    pub async fn create_order(&mut self, order: Order) -> ProcurementResult<Order> {
        self.validator.validate_order(&order)?;

        if order.status != OrderStatus::Pending {
            return Err(ProcurementError::Validation(format!(
                "New orders must be {}, got {}",
                OrderStatus::Pending,
                order.status
            )));
        }

        self.storage.save_order(&order).await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            items = order.items.len(),
            total_amount = %order.total_amount,
            "order created"
        );

        Ok(order)
    }

    /// Get an order by ID
    pub async fn get_order(&self, order_id: &str) -> ProcurementResult<Option<Order>> {
        self.storage.get_order(order_id).await
    }

    /// Get an order by ID, returning an error if not found
    pub async fn get_order_required(&self, order_id: &str) -> ProcurementResult<Order> {
        self.storage
            .get_order(order_id)
            .await?
            .ok_or_else(|| ProcurementError::OrderNotFound(order_id.to_string()))
    }

    /// List orders matching a filter
    pub async fn list_orders(&self, filter: &OrderFilter) -> ProcurementResult<Vec<Order>> {
        self.storage.list_orders(filter).await
    }

    /// Move an order to a new status by hand
    ///
    /// Only `PENDING -> DELIVERED` is accepted here. `RECONCILED` is reached
    /// solely by committing a reconciliation. Setting the current status again
    /// is a no-op.
    pub async fn update_status(
        &mut self,
        order_id: &str,
        status: OrderStatus,
    ) -> ProcurementResult<Order> {
        let mut order = self.get_order_required(order_id).await?;

        if order.status == status {
            return Ok(order);
        }

        if status == OrderStatus::Reconciled || !order.status.can_transition_to(status) {
            warn!(order_id, from = %order.status, to = %status, "rejected status change");
            return Err(ProcurementError::InvalidStatusTransition {
                from: order.status,
                to: status,
            });
        }

        order.status = status;
        order.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_order(&order).await?;
        Ok(order)
    }
}

struct PendingItem {
    product_id: Option<String>,
    name: String,
    unit: String,
    price: BigDecimal,
    quantity: u32,
}

impl PendingItem {
    /// Lines sharing this key are the same product
    fn merge_key(&self) -> String {
        match &self.product_id {
            Some(id) => id.clone(),
            None => format!("{}|{}|{}", self.name, self.unit, self.price.normalized()),
        }
    }
}

/// Order builder for assembling an order from raw lines
pub struct OrderBuilder {
    supplier_id: String,
    supplier_name: String,
    order_date: NaiveDate,
    notes: Option<String>,
    order_number: Option<String>,
    number_prefix: String,
    number_length: usize,
    items: Vec<PendingItem>,
}

impl OrderBuilder {
    /// Create a new order builder
    pub fn new(supplier_id: String, supplier_name: String, order_date: NaiveDate) -> Self {
        Self {
            supplier_id,
            supplier_name,
            order_date,
            notes: None,
            order_number: None,
            number_prefix: DEFAULT_ORDER_NUMBER_PREFIX.to_string(),
            number_length: DEFAULT_ORDER_NUMBER_LENGTH,
            items: Vec::new(),
        }
    }

    pub fn notes(mut self, notes: String) -> Self {
        self.notes = Some(notes);
        self
    }

    /// Use a fixed order number instead of generating one
    pub fn order_number(mut self, order_number: String) -> Self {
        self.order_number = Some(order_number);
        self
    }

    /// Change how a generated order number looks
    pub fn numbering(mut self, prefix: String, length: usize) -> Self {
        self.number_prefix = prefix;
        self.number_length = length;
        self
    }

    /// Add a line taken from the product catalog
    pub fn product(
        self,
        product_id: String,
        name: String,
        unit: String,
        price: BigDecimal,
        quantity: u32,
    ) -> Self {
        self.line(Some(product_id), name, unit, price, quantity)
    }

    /// Add a free-form line
    pub fn item(self, name: String, unit: String, price: BigDecimal, quantity: u32) -> Self {
        self.line(None, name, unit, price, quantity)
    }

    fn line(
        mut self,
        product_id: Option<String>,
        name: String,
        unit: String,
        price: BigDecimal,
        quantity: u32,
    ) -> Self {
        self.items.push(PendingItem {
            product_id,
            name,
            unit,
            price,
            quantity,
        });
        self
    }

    /// Build the order
    ///
    /// Lines for the same product (same product id, or same name, unit and
    /// price when there is none) are merged into the first such line with
    /// their quantities summed.
    pub fn build(self) -> ProcurementResult<Order> {
        if self.supplier_id.trim().is_empty() {
            return Err(ProcurementError::Validation(
                "Supplier ID cannot be empty".to_string(),
            ));
        }

        let mut merged: Vec<(String, PendingItem)> = Vec::new();
        for item in self.items {
            let key = item.merge_key();
            match merged.iter_mut().find(|(k, _)| *k == key) {
                Some((_, existing)) => {
                    existing.quantity =
                        existing.quantity.checked_add(item.quantity).ok_or_else(|| {
                            ProcurementError::Validation(format!(
                                "Quantity overflow for item '{}'",
                                item.name
                            ))
                        })?;
                }
                None => merged.push((key, item)),
            }
        }

        let order_number = self
            .order_number
            .unwrap_or_else(|| generate_order_number(&self.number_prefix, self.number_length));

        let mut order = Order::new(
            order_number,
            self.order_date,
            self.supplier_id,
            self.supplier_name,
            self.notes,
        );
        for (_, item) in merged {
            order.add_item(OrderLineItem::new(
                item.product_id,
                item.name,
                item.unit,
                item.price,
                item.quantity,
            ));
        }

        crate::utils::validation::validate_order(&order)?;
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    }

    fn builder() -> OrderBuilder {
        OrderBuilder::new("sup-1".to_string(), "Brick Works".to_string(), date())
    }

    #[test]
    fn test_generate_order_number() {
        let number = generate_order_number("ORD-", 10);
        assert!(number.starts_with("ORD-"));
        assert_eq!(number.len(), 14);
        assert!(number[4..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));

        assert_eq!(generate_order_number("X", 100).len(), 33);
    }

    #[test]
    fn test_builder_merges_duplicate_lines() {
        let order = builder()
            .product(
                "prod-1".to_string(),
                "Brick".to_string(),
                "pcs".to_string(),
                BigDecimal::from(2),
                100,
            )
            .item(
                "Mortar".to_string(),
                "kg".to_string(),
                BigDecimal::from(3),
                5,
            )
            .product(
                "prod-1".to_string(),
                "Brick".to_string(),
                "pcs".to_string(),
                BigDecimal::from(2),
                50,
            )
            .item(
                "Mortar".to_string(),
                "kg".to_string(),
                "3.00".parse().unwrap(),
                5,
            )
            .item(
                "Mortar".to_string(),
                "kg".to_string(),
                BigDecimal::from(4),
                1,
            )
            .build()
            .unwrap();

        assert_eq!(order.items.len(), 3);
        assert_eq!(order.items[0].name, "Brick");
        assert_eq!(order.items[0].quantity, 150);
        assert_eq!(order.items[1].quantity, 10);
        assert_eq!(order.items[2].price, BigDecimal::from(4));
        assert_eq!(order.total_amount, BigDecimal::from(300 + 30 + 4));
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.order_number.starts_with(DEFAULT_ORDER_NUMBER_PREFIX));
    }

    #[test]
    fn test_builder_validation() {
        assert!(builder().build().is_err());

        let zero = builder()
            .item("Sand".to_string(), "ton".to_string(), BigDecimal::from(1), 0)
            .build();
        assert!(zero.is_err());

        let negative = builder()
            .item("Sand".to_string(), "ton".to_string(), BigDecimal::from(-1), 1)
            .build();
        assert!(negative.is_err());

        let no_supplier = OrderBuilder::new(String::new(), "Nobody".to_string(), date())
            .item("Sand".to_string(), "ton".to_string(), BigDecimal::from(1), 1)
            .build();
        assert!(no_supplier.is_err());
    }

    #[test]
    fn test_summarize_orders() {
        let a = builder()
            .item("Sand".to_string(), "ton".to_string(), BigDecimal::from(40), 2)
            .build()
            .unwrap();
        let b = builder()
            .item("Lime".to_string(), "kg".to_string(), BigDecimal::from(3), 5)
            .build()
            .unwrap();

        let summary = summarize_orders(&[a, b]);
        assert_eq!(summary.total_spend, BigDecimal::from(95));
        assert_eq!(summary.total_count, 2);
    }

    #[tokio::test]
    async fn test_status_updates() {
        let mut manager = OrderManager::new(MemoryStorage::new());
        let order = builder()
            .order_number("ORD-FIXED".to_string())
            .item("Sand".to_string(), "ton".to_string(), BigDecimal::from(40), 2)
            .build()
            .unwrap();
        let order = manager.create_order(order).await.unwrap();
        assert_eq!(order.order_number, "ORD-FIXED");

        let err = manager
            .update_status(&order.id, OrderStatus::Reconciled)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProcurementError::InvalidStatusTransition {
                from: OrderStatus::Pending,
                to: OrderStatus::Reconciled
            }
        ));

        let delivered = manager
            .update_status(&order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);

        let again = manager
            .update_status(&order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(again.status, OrderStatus::Delivered);

        let back = manager
            .update_status(&order.id, OrderStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(back, ProcurementError::InvalidStatusTransition { .. }));

        let missing = manager
            .update_status("ghost", OrderStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(missing, ProcurementError::OrderNotFound(_)));
    }
}
