//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::reconciliation::ReceivedQuantities;
use crate::types::*;
use crate::utils::validation;

/// Storage abstraction for orders and reconciliations
///
/// This trait allows the procurement core to work with any storage backend
/// (PostgreSQL, SQLite, in-memory, etc.) by implementing these methods.
#[async_trait]
pub trait ProcurementStorage: Send + Sync {
    /// Save a new order to storage
    async fn save_order(&mut self, order: &Order) -> ProcurementResult<()>;

    /// Get an order by ID
    async fn get_order(&self, order_id: &str) -> ProcurementResult<Option<Order>>;

    /// List orders matching a filter, newest order date first
    async fn list_orders(&self, filter: &OrderFilter) -> ProcurementResult<Vec<Order>>;

    /// Update an existing order
    async fn update_order(&mut self, order: &Order) -> ProcurementResult<()>;

    /// Persist a reconciliation and mark its order reconciled in one step
    ///
    /// Implementations must enforce at most one reconciliation per order
    /// (returning [`ProcurementError::AlreadyReconciled`]) as part of the same
    /// atomic step, so concurrent commits for one order cannot both succeed.
    async fn commit_reconciliation(
        &mut self,
        reconciliation: &Reconciliation,
    ) -> ProcurementResult<()>;

    /// Get a reconciliation by ID
    async fn get_reconciliation(
        &self,
        reconciliation_id: &str,
    ) -> ProcurementResult<Option<Reconciliation>>;

    /// Get the reconciliation recorded for an order, if any
    async fn get_reconciliation_for_order(
        &self,
        order_id: &str,
    ) -> ProcurementResult<Option<Reconciliation>>;

    /// List all reconciliations, most recently created first
    async fn list_reconciliations(&self) -> ProcurementResult<Vec<Reconciliation>>;
}

/// Trait for implementing custom order validation rules
pub trait OrderValidator: Send + Sync {
    /// Validate an order before saving
    fn validate_order(&self, order: &Order) -> ProcurementResult<()>;
}

/// Trait for implementing custom reconciliation request validation rules
pub trait ReconciliationValidator: Send + Sync {
    /// Check the request shape before any order lookup
    fn validate_request(&self, request: &ReconciliationRequest) -> ProcurementResult<()>;

    /// Check the request against the order and resolve received quantities
    fn resolve_received(
        &self,
        request: &ReconciliationRequest,
        order: &Order,
    ) -> ProcurementResult<ReceivedQuantities>;
}

/// Default order validator
pub struct DefaultOrderValidator;

impl OrderValidator for DefaultOrderValidator {
    fn validate_order(&self, order: &Order) -> ProcurementResult<()> {
        validation::validate_order(order)
    }
}

/// Default reconciliation validator, rejecting anything it cannot account for
pub struct DefaultReconciliationValidator;

impl ReconciliationValidator for DefaultReconciliationValidator {
    fn validate_request(&self, request: &ReconciliationRequest) -> ProcurementResult<()> {
        validation::validate_reconciliation_request(request)
    }

    fn resolve_received(
        &self,
        request: &ReconciliationRequest,
        order: &Order,
    ) -> ProcurementResult<ReceivedQuantities> {
        validation::resolve_received_quantities(request, order)
    }
}
