//! Incident log and CSV export

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Column header of the incident export
pub const INCIDENT_CSV_HEADER: &str =
    "Date,Order Number,Item Name,Unit,Ordered,Received,Missing,Loss Value,Notes";

/// A reconciliation that recorded a loss, with the order it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub reconciliation: Reconciliation,
    pub order_number: String,
    pub supplier_name: String,
}

/// Pair loss-bearing reconciliations with their orders
///
/// Reconciliations whose order is not in `orders` are skipped. Input order is
/// kept.
pub fn collect_incidents(reconciliations: &[Reconciliation], orders: &[Order]) -> Vec<Incident> {
    reconciliations
        .iter()
        .filter(|r| r.has_losses())
        .filter_map(|r| {
            orders.iter().find(|o| o.id == r.order_id()).map(|o| Incident {
                reconciliation: r.clone(),
                order_number: o.order_number.clone(),
                supplier_name: o.supplier_name.clone(),
            })
        })
        .collect()
}

/// Render incidents as CSV, one row per line item that lost value
///
/// Rows are ordered by reconciliation date, newest first. Every data field is
/// quoted so free-text units, names and notes cannot shift columns.
pub fn export_incidents_csv(incidents: &[Incident]) -> ProcurementResult<String> {
    let mut sorted: Vec<&Incident> = incidents.iter().collect();
    sorted.sort_by(|a, b| {
        b.reconciliation
            .outcome
            .reconciliation_date
            .cmp(&a.reconciliation.outcome.reconciliation_date)
    });

    let mut buf = format!("{INCIDENT_CSV_HEADER}\n").into_bytes();
    {
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(&mut buf);

        for incident in sorted {
            let outcome = &incident.reconciliation.outcome;
            let date = outcome.reconciliation_date.format("%Y-%m-%d").to_string();
            let notes = outcome.notes.as_deref().unwrap_or("");

            for item in outcome
                .items
                .iter()
                .filter(|i| i.loss_value > BigDecimal::from(0))
            {
                let record: [&str; 9] = [
                    &date,
                    &incident.order_number,
                    &item.name,
                    &item.unit,
                    &item.ordered_qty.to_string(),
                    &item.received_qty.to_string(),
                    &item.missing_qty.to_string(),
                    &format_money(&item.loss_value),
                    notes,
                ];
                writer.write_record(record).map_err(export_error)?;
            }
        }
        writer.flush().map_err(export_error)?;
    }

    String::from_utf8(buf).map_err(export_error)
}

/// Two fixed decimals, e.g. `10.00`
pub fn format_money(value: &BigDecimal) -> String {
    value.round(2).with_scale(2).to_string()
}

fn export_error(e: impl std::fmt::Display) -> ProcurementError {
    ProcurementError::Export(e.to_string())
}
