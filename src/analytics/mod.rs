//! Loss analytics over stored reconciliations

pub mod export;
pub mod loss;

pub use export::*;
pub use loss::*;
