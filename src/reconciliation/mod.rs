//! Delivery reconciliation: ordered versus received quantities and the
//! resulting monetary loss
//!
//! [`engine`] holds the pure computation; [`manager`] wraps it with the order
//! preconditions and the once-per-order persistence rule.

pub mod engine;
pub mod manager;

pub use engine::*;
pub use manager::*;
