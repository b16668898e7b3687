//! Procurement module containing order management and the orchestrator

pub mod core;
pub mod order;

pub use self::core::*;
pub use order::*;
