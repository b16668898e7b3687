//! Reconciliation persistence and preconditions

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::reconciliation::engine::{verify_outcome, ReconciliationEngine};
use crate::traits::*;
use crate::types::*;

/// Reconciliation manager for running and storing reconciliations
pub struct ReconciliationManager<S: ProcurementStorage> {
    pub(crate) storage: S,
    validator: Box<dyn ReconciliationValidator>,
}

impl<S: ProcurementStorage> ReconciliationManager<S> {
    /// Create a new reconciliation manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultReconciliationValidator),
        }
    }

    /// Create a new reconciliation manager with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn ReconciliationValidator>) -> Self {
        Self { storage, validator }
    }

    /// Reconcile an order using snapshot prices
    pub async fn reconcile(
        &mut self,
        request: ReconciliationRequest,
    ) -> ProcurementResult<Reconciliation> {
        self.reconcile_with(request, &ReconciliationEngine::new())
            .await
    }

    /// Reconcile an order with a configured engine
    ///
    /// Rejects unknown and already reconciled orders before the engine runs.
    pub async fn reconcile_with(
        &mut self,
        request: ReconciliationRequest,
        engine: &ReconciliationEngine,
    ) -> ProcurementResult<Reconciliation> {
        self.validator.validate_request(&request)?;

        let order = self
            .storage
            .get_order(&request.order_id)
            .await?
            .ok_or_else(|| ProcurementError::OrderNotFound(request.order_id.clone()))?;

        if order.is_reconciled()
            || self
                .storage
                .get_reconciliation_for_order(&order.id)
                .await?
                .is_some()
        {
            warn!(order_id = %order.id, "rejected second reconciliation");
            return Err(ProcurementError::AlreadyReconciled(order.id.clone()));
        }

        let received = self.validator.resolve_received(&request, &order)?;
        let date = request
            .reconciliation_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive());

        let outcome = engine.reconcile(&order, &received, date, request.notes);
        let reconciliation = Reconciliation::new(outcome);

        self.storage.commit_reconciliation(&reconciliation).await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            reconciliation_id = %reconciliation.id,
            total_loss_value = %reconciliation.total_loss_value(),
            "order reconciled"
        );

        Ok(reconciliation)
    }

    /// Get a reconciliation by ID
    pub async fn get_reconciliation(
        &self,
        reconciliation_id: &str,
    ) -> ProcurementResult<Option<Reconciliation>> {
        self.storage.get_reconciliation(reconciliation_id).await
    }

    /// Get a reconciliation by ID, returning an error if not found
    pub async fn get_reconciliation_required(
        &self,
        reconciliation_id: &str,
    ) -> ProcurementResult<Reconciliation> {
        self.storage
            .get_reconciliation(reconciliation_id)
            .await?
            .ok_or_else(|| ProcurementError::ReconciliationNotFound(reconciliation_id.to_string()))
    }

    /// Get the reconciliation for an order
    pub async fn get_for_order(&self, order_id: &str) -> ProcurementResult<Option<Reconciliation>> {
        self.storage.get_reconciliation_for_order(order_id).await
    }

    /// List all reconciliations, newest first
    pub async fn list_reconciliations(&self) -> ProcurementResult<Vec<Reconciliation>> {
        self.storage.list_reconciliations().await
    }

    /// Most recent reconciliations, optionally only those that recorded a loss
    pub async fn recent(
        &self,
        limit: usize,
        only_with_losses: bool,
    ) -> ProcurementResult<Vec<Reconciliation>> {
        Ok(self
            .storage
            .list_reconciliations()
            .await?
            .into_iter()
            .filter(|r| !only_with_losses || r.has_losses())
            .take(limit)
            .collect())
    }

    /// Re-derive a stored reconciliation and report any inconsistency
    pub async fn verify(
        &self,
        reconciliation_id: &str,
    ) -> ProcurementResult<ReconciliationIntegrityReport> {
        let reconciliation = self.get_reconciliation_required(reconciliation_id).await?;
        Ok(ReconciliationIntegrityReport::check(&reconciliation))
    }
}

/// Report on whether a stored reconciliation still matches its inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationIntegrityReport {
    pub reconciliation_id: String,
    pub order_id: String,
    pub is_valid: bool,
    pub issues: Vec<String>,
}

impl ReconciliationIntegrityReport {
    pub fn check(reconciliation: &Reconciliation) -> Self {
        let issues = verify_outcome(&reconciliation.outcome);
        Self {
            reconciliation_id: reconciliation.id.clone(),
            order_id: reconciliation.order_id().to_string(),
            is_valid: issues.is_empty(),
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    async fn seeded() -> (MemoryStorage, Order) {
        let mut storage = MemoryStorage::new();
        let mut order = Order::new(
            "ORD-42".to_string(),
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            "sup-1".to_string(),
            "Timber Ltd".to_string(),
            None,
        );
        order.add_item(OrderLineItem::new(
            None,
            "Plank".to_string(),
            "pcs".to_string(),
            BigDecimal::from(12),
            10,
        ));
        storage.save_order(&order).await.unwrap();
        (storage, order)
    }

    #[tokio::test]
    async fn test_reconcile_persists_and_marks_order() {
        let (storage, order) = seeded().await;
        let mut manager = ReconciliationManager::new(storage.clone());

        let request = ReconciliationRequest::new(order.id.clone())
            .received(order.items[0].id.clone(), 7)
            .dated(NaiveDate::from_ymd_opt(2024, 4, 3).unwrap());
        let reconciliation = manager.reconcile(request).await.unwrap();

        assert_eq!(*reconciliation.total_loss_value(), BigDecimal::from(36));
        assert_eq!(
            reconciliation.outcome.reconciliation_date,
            NaiveDate::from_ymd_opt(2024, 4, 3).unwrap()
        );

        let stored_order = storage.get_order(&order.id).await.unwrap().unwrap();
        assert_eq!(stored_order.status, OrderStatus::Reconciled);

        let fetched = manager
            .get_reconciliation_required(&reconciliation.id)
            .await
            .unwrap();
        assert_eq!(fetched, reconciliation);
        assert!(manager.verify(&reconciliation.id).await.unwrap().is_valid);
    }

    #[tokio::test]
    async fn test_second_reconciliation_rejected() {
        let (storage, order) = seeded().await;
        let mut manager = ReconciliationManager::new(storage);
        let item_id = order.items[0].id.clone();

        let first = manager
            .reconcile(ReconciliationRequest::new(order.id.clone()).received(item_id.clone(), 10))
            .await
            .unwrap();

        let err = manager
            .reconcile(ReconciliationRequest::new(order.id.clone()).received(item_id, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcurementError::AlreadyReconciled(_)));

        let kept = manager.get_for_order(&order.id).await.unwrap().unwrap();
        assert_eq!(kept, first);
        assert_eq!(*kept.total_loss_value(), BigDecimal::from(0));
    }

    #[tokio::test]
    async fn test_failure_reasons_are_distinct() {
        let (storage, order) = seeded().await;
        let mut manager = ReconciliationManager::new(storage);

        let missing = manager
            .reconcile(ReconciliationRequest::new("no-such-order".to_string()).received("x", 1))
            .await
            .unwrap_err();
        assert!(matches!(missing, ProcurementError::OrderNotFound(_)));

        let unknown_item = manager
            .reconcile(ReconciliationRequest::new(order.id.clone()).received("x", 1))
            .await
            .unwrap_err();
        assert!(matches!(unknown_item, ProcurementError::Validation(_)));

        let empty = manager
            .reconcile(ReconciliationRequest::new(order.id.clone()))
            .await
            .unwrap_err();
        assert!(matches!(empty, ProcurementError::Validation(_)));

        let not_found = manager
            .get_reconciliation_required("nothing")
            .await
            .unwrap_err();
        assert!(matches!(not_found, ProcurementError::ReconciliationNotFound(_)));

        // Failed attempts leave the order open.
        assert!(manager.get_for_order(&order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_defaults_date_to_today() {
        let (storage, order) = seeded().await;
        let mut manager = ReconciliationManager::new(storage);
        let before = chrono::Utc::now().date_naive();

        let reconciliation = manager
            .reconcile(
                ReconciliationRequest::new(order.id.clone()).received(order.items[0].id.clone(), 10),
            )
            .await
            .unwrap();

        let after = chrono::Utc::now().date_naive();
        let date = reconciliation.outcome.reconciliation_date;
        assert!(date >= before && date <= after);
    }
}
