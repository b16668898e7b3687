//! # Procurement Core
//!
//! Order tracking, delivery reconciliation and loss analytics for a
//! business buying goods from suppliers.
//!
//! ## Features
//!
//! - **Orders**: Line items frozen at order time, duplicate lines merged, spend summaries
//! - **Reconciliation**: Ordered versus received quantities, missing quantity and monetary loss per line
//! - **Once per order**: The storage layer refuses a second reconciliation for the same order
//! - **Loss analytics**: Monthly totals, worst items, incident rate, CSV export
//! - **Storage abstraction**: Database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use procurement_core::{compute_line_item, LineItemStatus};
//! use bigdecimal::BigDecimal;
//!
//! let outcome = compute_line_item(10, 8, &BigDecimal::from(5));
//! assert_eq!(outcome.missing_qty, 2);
//! assert_eq!(outcome.loss_value, BigDecimal::from(10));
//! assert_eq!(outcome.status, LineItemStatus::Missing);
//! ```

pub mod analytics;
pub mod config;
pub mod procurement;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use analytics::*;
pub use config::*;
pub use procurement::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
