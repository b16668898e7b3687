//! Loss aggregation over stored reconciliations
//!
//! These functions only group and sum values the engine already computed.

use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::*;

/// Headline numbers for a dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LossOverview {
    /// Sum of total loss over reconciliations that recorded a loss
    pub total_losses: BigDecimal,
    pub pending_orders: usize,
    pub reconciled_orders: usize,
}

/// Loss total for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyLoss {
    /// `YYYY-MM`
    pub month: String,
    pub total: BigDecimal,
}

/// Accumulated loss for one item across reconciliations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemLoss {
    pub name: String,
    pub unit: String,
    pub total_loss_value: BigDecimal,
    pub total_missing_qty: u64,
}

/// Worst items, ranked two ways
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopItems {
    pub by_loss_value: Vec<ItemLoss>,
    pub by_missing_qty: Vec<ItemLoss>,
}

/// How often reconciliations turn up a loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LossRate {
    /// Incidents divided by all reconciliations, 0 when there are none
    pub incidents_ratio: f64,
    pub total_reconciled: usize,
    pub incidents_with_loss: usize,
    /// Exact quotient, 0 when there are no incidents
    pub average_loss_per_incident: BigDecimal,
}

/// Totals over reconciliations that recorded a loss
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlSummary {
    pub incident_count: usize,
    pub total_items_missing: u64,
    pub total_loss_sum: BigDecimal,
}

/// Dashboard overview across reconciliations and orders
pub fn loss_overview(reconciliations: &[Reconciliation], orders: &[Order]) -> LossOverview {
    LossOverview {
        total_losses: total_incident_loss(reconciliations),
        pending_orders: orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count(),
        reconciled_orders: reconciliations.len(),
    }
}

/// Loss per month for the `months` months ending with `as_of`'s month
///
/// Every month gets a bucket, zero when nothing was lost. Buckets are
/// ascending. Reconciliations dated after `as_of` are ignored.
pub fn monthly_loss(
    reconciliations: &[Reconciliation],
    months: u16,
    as_of: NaiveDate,
) -> Vec<MonthlyLoss> {
    let current = as_of.year() * 12 + as_of.month0() as i32;
    let mut buckets: BTreeMap<i32, BigDecimal> = (0..i32::from(months))
        .map(|back| (current - back, BigDecimal::from(0)))
        .collect();

    for reconciliation in reconciliations {
        let date = reconciliation.outcome.reconciliation_date;
        if date > as_of {
            continue;
        }
        let index = date.year() * 12 + date.month0() as i32;
        if let Some(total) = buckets.get_mut(&index) {
            *total += reconciliation.total_loss_value();
        }
    }

    buckets
        .into_iter()
        .map(|(index, total)| MonthlyLoss {
            month: month_key(index),
            total,
        })
        .collect()
}

fn month_key(month_index: i32) -> String {
    format!(
        "{:04}-{:02}",
        month_index.div_euclid(12),
        month_index.rem_euclid(12) + 1
    )
}

/// Items with a loss grouped by name and unit, top `limit` two ways
pub fn top_items(reconciliations: &[Reconciliation], limit: usize) -> TopItems {
    let mut grouped: Vec<ItemLoss> = Vec::new();

    for item in reconciliations
        .iter()
        .flat_map(|r| r.outcome.items.iter())
        .filter(|i| i.loss_value > BigDecimal::from(0))
    {
        match grouped
            .iter_mut()
            .find(|g| g.name == item.name && g.unit == item.unit)
        {
            Some(group) => {
                group.total_loss_value += &item.loss_value;
                group.total_missing_qty += u64::from(item.missing_qty);
            }
            None => grouped.push(ItemLoss {
                name: item.name.clone(),
                unit: item.unit.clone(),
                total_loss_value: item.loss_value.clone(),
                total_missing_qty: u64::from(item.missing_qty),
            }),
        }
    }

    let mut by_loss_value = grouped.clone();
    by_loss_value.sort_by(|a, b| b.total_loss_value.cmp(&a.total_loss_value));
    by_loss_value.truncate(limit);

    let mut by_missing_qty = grouped;
    by_missing_qty.sort_by(|a, b| b.total_missing_qty.cmp(&a.total_missing_qty));
    by_missing_qty.truncate(limit);

    TopItems {
        by_loss_value,
        by_missing_qty,
    }
}

/// Share of reconciliations with a loss and the average loss among them
pub fn loss_rate(reconciliations: &[Reconciliation]) -> LossRate {
    let total_reconciled = reconciliations.len();
    let incidents_with_loss = reconciliations.iter().filter(|r| r.has_losses()).count();
    let total_loss = total_incident_loss(reconciliations);

    let incidents_ratio = if total_reconciled > 0 {
        incidents_with_loss as f64 / total_reconciled as f64
    } else {
        0.0
    };
    let average_loss_per_incident = if incidents_with_loss > 0 {
        total_loss / BigDecimal::from(incidents_with_loss as u64)
    } else {
        BigDecimal::from(0)
    };

    LossRate {
        incidents_ratio,
        total_reconciled,
        incidents_with_loss,
        average_loss_per_incident,
    }
}

/// Incident count, missing quantity and loss over loss-bearing reconciliations
pub fn control_summary(reconciliations: &[Reconciliation]) -> ControlSummary {
    let incidents: Vec<&Reconciliation> =
        reconciliations.iter().filter(|r| r.has_losses()).collect();

    ControlSummary {
        incident_count: incidents.len(),
        total_items_missing: incidents.iter().map(|r| r.outcome.total_missing_qty()).sum(),
        total_loss_sum: incidents.iter().map(|r| r.total_loss_value()).sum(),
    }
}

fn total_incident_loss(reconciliations: &[Reconciliation]) -> BigDecimal {
    reconciliations
        .iter()
        .filter(|r| r.has_losses())
        .map(|r| r.total_loss_value())
        .sum()
}
