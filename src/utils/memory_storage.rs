//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    orders: Arc<RwLock<HashMap<String, Order>>>,
    /// Insertion order doubles as creation order
    reconciliations: Arc<RwLock<Vec<Reconciliation>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
            reconciliations: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> ProcurementResult<()> {
        write(&self.orders)?.clear();
        write(&self.reconciliations)?.clear();
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> ProcurementResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| ProcurementError::Storage("Storage lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> ProcurementResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| ProcurementError::Storage("Storage lock poisoned".to_string()))
}

#[async_trait]
impl ProcurementStorage for MemoryStorage {
    async fn save_order(&mut self, order: &Order) -> ProcurementResult<()> {
        let mut orders = write(&self.orders)?;
        if orders.contains_key(&order.id) {
            return Err(ProcurementError::Storage(format!(
                "Order '{}' already exists",
                order.id
            )));
        }
        orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn get_order(&self, order_id: &str) -> ProcurementResult<Option<Order>> {
        Ok(read(&self.orders)?.get(order_id).cloned())
    }

    async fn list_orders(&self, filter: &OrderFilter) -> ProcurementResult<Vec<Order>> {
        let orders = read(&self.orders)?;
        let mut filtered: Vec<Order> = orders
            .values()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect();

        filtered.sort_by(|a, b| {
            b.order_date
                .cmp(&a.order_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(filtered)
    }

    async fn update_order(&mut self, order: &Order) -> ProcurementResult<()> {
        let mut orders = write(&self.orders)?;
        match orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(())
            }
            None => Err(ProcurementError::OrderNotFound(order.id.clone())),
        }
    }

    async fn commit_reconciliation(
        &mut self,
        reconciliation: &Reconciliation,
    ) -> ProcurementResult<()> {
        // Both locks are held until the record and the status change land.
        let mut orders = write(&self.orders)?;
        let mut reconciliations = write(&self.reconciliations)?;

        let order_id = reconciliation.order_id();
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| ProcurementError::OrderNotFound(order_id.to_string()))?;

        if order.is_reconciled() || reconciliations.iter().any(|r| r.order_id() == order_id) {
            return Err(ProcurementError::AlreadyReconciled(order_id.to_string()));
        }

        reconciliations.push(reconciliation.clone());
        order.status = OrderStatus::Reconciled;
        order.updated_at = chrono::Utc::now().naive_utc();
        Ok(())
    }

    async fn get_reconciliation(
        &self,
        reconciliation_id: &str,
    ) -> ProcurementResult<Option<Reconciliation>> {
        Ok(read(&self.reconciliations)?
            .iter()
            .find(|r| r.id == reconciliation_id)
            .cloned())
    }

    async fn get_reconciliation_for_order(
        &self,
        order_id: &str,
    ) -> ProcurementResult<Option<Reconciliation>> {
        Ok(read(&self.reconciliations)?
            .iter()
            .find(|r| r.order_id() == order_id)
            .cloned())
    }

    async fn list_reconciliations(&self) -> ProcurementResult<Vec<Reconciliation>> {
        let mut list: Vec<Reconciliation> =
            read(&self.reconciliations)?.iter().rev().cloned().collect();
        // Stable sort keeps later inserts first when timestamps tie.
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }
}
