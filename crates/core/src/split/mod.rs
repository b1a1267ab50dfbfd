//! Even and installment split arithmetic.
//!
//! This module implements the split calculator:
//! - Even splits across the current team size
//! - Installment plans with round-up monthly and per-participant amounts
//! - Due-date derivation with end-of-month clamping
//! - Error types for split validation

pub mod calculator;
pub mod error;

#[cfg(test)]
mod props;

pub use calculator::{
    InstallmentPlan, MAX_INSTALLMENT_MONTHS, due_dates, even_share, installment_plan,
};
pub use error::SplitError;
