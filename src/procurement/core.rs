//! Main procurement orchestrator that coordinates orders, reconciliations
//! and loss analytics

use chrono::NaiveDate;

use crate::analytics::{
    self, ControlSummary, Incident, LossOverview, LossRate, MonthlyLoss, TopItems,
};
use crate::config::ProcurementConfig;
use crate::procurement::{summarize_orders, OrderBuilder, OrderManager};
use crate::reconciliation::{
    ReconciliationEngine, ReconciliationIntegrityReport, ReconciliationManager,
};
use crate::traits::*;
use crate::types::*;

/// Main procurement system that orchestrates all operations
pub struct Procurement<S: ProcurementStorage> {
    order_manager: OrderManager<S>,
    reconciliation_manager: ReconciliationManager<S>,
    config: ProcurementConfig,
}

impl<S: ProcurementStorage + Clone> Procurement<S> {
    /// Create a new procurement system with the given storage backend
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, ProcurementConfig::default())
    }

    /// Create a new procurement system with custom configuration
    pub fn with_config(storage: S, config: ProcurementConfig) -> Self {
        Self {
            order_manager: OrderManager::new(storage.clone()),
            reconciliation_manager: ReconciliationManager::new(storage),
            config,
        }
    }

    /// Create a new procurement system with custom validators
    pub fn with_validators(
        storage: S,
        config: ProcurementConfig,
        order_validator: Box<dyn OrderValidator>,
        reconciliation_validator: Box<dyn ReconciliationValidator>,
    ) -> Self {
        Self {
            order_manager: OrderManager::with_validator(storage.clone(), order_validator),
            reconciliation_manager: ReconciliationManager::with_validator(
                storage,
                reconciliation_validator,
            ),
            config,
        }
    }

    pub fn config(&self) -> &ProcurementConfig {
        &self.config
    }

    // Order operations
    /// Start an order numbered according to the configuration
    pub fn order_builder(
        &self,
        supplier_id: String,
        supplier_name: String,
        order_date: NaiveDate,
    ) -> OrderBuilder {
        OrderBuilder::new(supplier_id, supplier_name, order_date).numbering(
            self.config.order_number_prefix.clone(),
            self.config.order_number_length,
        )
    }

    /// Place a new order
    pub async fn create_order(&mut self, order: Order) -> ProcurementResult<Order> {
        self.order_manager.create_order(order).await
    }

    /// Get an order by ID
    pub async fn get_order(&self, order_id: &str) -> ProcurementResult<Option<Order>> {
        self.order_manager.get_order(order_id).await
    }

    /// List orders matching a filter
    pub async fn list_orders(&self, filter: &OrderFilter) -> ProcurementResult<Vec<Order>> {
        self.order_manager.list_orders(filter).await
    }

    /// Spend summary over the orders matching a filter
    pub async fn order_summary(&self, filter: &OrderFilter) -> ProcurementResult<OrderSummary> {
        let orders = self.list_orders(filter).await?;
        Ok(summarize_orders(&orders))
    }

    /// Manually move an order to a new status
    pub async fn update_order_status(
        &mut self,
        order_id: &str,
        status: OrderStatus,
    ) -> ProcurementResult<Order> {
        self.order_manager.update_status(order_id, status).await
    }

    // Reconciliation operations
    /// Reconcile an order's delivery
    pub async fn reconcile(
        &mut self,
        request: ReconciliationRequest,
    ) -> ProcurementResult<Reconciliation> {
        self.reconciliation_manager.reconcile(request).await
    }

    /// Reconcile an order's delivery with a configured engine
    pub async fn reconcile_with(
        &mut self,
        request: ReconciliationRequest,
        engine: &ReconciliationEngine,
    ) -> ProcurementResult<Reconciliation> {
        self.reconciliation_manager
            .reconcile_with(request, engine)
            .await
    }

    /// Get a reconciliation by ID
    pub async fn get_reconciliation(
        &self,
        reconciliation_id: &str,
    ) -> ProcurementResult<Option<Reconciliation>> {
        self.reconciliation_manager
            .get_reconciliation(reconciliation_id)
            .await
    }

    /// Get the reconciliation recorded for an order
    pub async fn get_order_reconciliation(
        &self,
        order_id: &str,
    ) -> ProcurementResult<Option<Reconciliation>> {
        self.reconciliation_manager.get_for_order(order_id).await
    }

    /// List all reconciliations, newest first
    pub async fn list_reconciliations(&self) -> ProcurementResult<Vec<Reconciliation>> {
        self.reconciliation_manager.list_reconciliations().await
    }

    /// Latest reconciliations for a dashboard
    pub async fn recent_reconciliations(
        &self,
        limit: Option<usize>,
        only_with_losses: bool,
    ) -> ProcurementResult<Vec<Reconciliation>> {
        let limit = self.config.clamp_recent_limit(limit);
        self.reconciliation_manager
            .recent(limit, only_with_losses)
            .await
    }

    // Analytics
    /// Headline loss numbers
    pub async fn loss_overview(&self) -> ProcurementResult<LossOverview> {
        let reconciliations = self.list_reconciliations().await?;
        let orders = self.list_orders(&OrderFilter::default()).await?;
        Ok(analytics::loss_overview(&reconciliations, &orders))
    }

    /// Loss per month up to and including `as_of`'s month
    pub async fn monthly_loss(
        &self,
        months: Option<u32>,
        as_of: NaiveDate,
    ) -> ProcurementResult<Vec<MonthlyLoss>> {
        let months = u16::try_from(self.config.clamp_months(months)).unwrap_or(u16::MAX);
        let reconciliations = self.list_reconciliations().await?;
        Ok(analytics::monthly_loss(&reconciliations, months, as_of))
    }

    /// Items losing the most value and the most quantity
    pub async fn top_items(&self, limit: Option<usize>) -> ProcurementResult<TopItems> {
        let limit = self.config.clamp_top_items_limit(limit);
        let reconciliations = self.list_reconciliations().await?;
        Ok(analytics::top_items(&reconciliations, limit))
    }

    /// Incident ratio and average loss per incident
    pub async fn loss_rate(&self) -> ProcurementResult<LossRate> {
        let reconciliations = self.list_reconciliations().await?;
        Ok(analytics::loss_rate(&reconciliations))
    }

    /// Totals over reconciliations that recorded a loss
    pub async fn control_summary(&self) -> ProcurementResult<ControlSummary> {
        let reconciliations = self.list_reconciliations().await?;
        Ok(analytics::control_summary(&reconciliations))
    }

    /// Loss-bearing reconciliations with their order numbers, newest first
    pub async fn incidents(&self) -> ProcurementResult<Vec<Incident>> {
        let reconciliations = self.list_reconciliations().await?;
        let orders = self.list_orders(&OrderFilter::default()).await?;
        Ok(analytics::collect_incidents(&reconciliations, &orders))
    }

    /// CSV export of every line item that lost value
    pub async fn export_incidents_csv(&self) -> ProcurementResult<String> {
        let incidents = self.incidents().await?;
        analytics::export_incidents_csv(&incidents)
    }

    /// Re-derive every stored reconciliation and match orders to records
    pub async fn validate_integrity(&self) -> ProcurementResult<ProcurementIntegrityReport> {
        let reconciliations = self.list_reconciliations().await?;
        let mut issues = Vec::new();

        for reconciliation in &reconciliations {
            let report = ReconciliationIntegrityReport::check(reconciliation);
            if !report.is_valid {
                issues.push(report);
            }

            let order = self.get_order(reconciliation.order_id()).await?;
            match order {
                Some(order) if order.status != OrderStatus::Reconciled => {
                    issues.push(ReconciliationIntegrityReport {
                        reconciliation_id: reconciliation.id.clone(),
                        order_id: order.id.clone(),
                        is_valid: false,
                        issues: vec![format!(
                            "Order '{}' is {} but has a reconciliation",
                            order.order_number, order.status
                        )],
                    });
                }
                Some(_) => {}
                None => issues.push(ReconciliationIntegrityReport {
                    reconciliation_id: reconciliation.id.clone(),
                    order_id: reconciliation.order_id().to_string(),
                    is_valid: false,
                    issues: vec!["Reconciliation refers to a missing order".to_string()],
                }),
            }
        }

        let reconciled = self
            .list_orders(&OrderFilter {
                status: Some(OrderStatus::Reconciled),
                ..Default::default()
            })
            .await?;
        let unmatched_orders: Vec<String> = reconciled
            .into_iter()
            .filter(|order| {
                !reconciliations
                    .iter()
                    .any(|r| r.order_id() == order.id)
            })
            .map(|order| order.id)
            .collect();

        Ok(ProcurementIntegrityReport {
            checked: reconciliations.len(),
            is_valid: issues.is_empty() && unmatched_orders.is_empty(),
            issues,
            unmatched_orders,
        })
    }
}

/// Report on consistency of every stored reconciliation
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProcurementIntegrityReport {
    pub checked: usize,
    pub is_valid: bool,
    pub issues: Vec<ReconciliationIntegrityReport>,
    /// Orders marked RECONCILED that have no reconciliation record
    pub unmatched_orders: Vec<String>,
}
