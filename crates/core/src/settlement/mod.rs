//! Settlement status state machine and batch authority checks.
//!
//! A settlement is one member's recorded obligation to the payer of one
//! expense. This module owns the legal status transitions, who may trigger
//! them, and the effect each transition has on the row.

pub mod error;
pub mod machine;
pub mod types;

#[cfg(test)]
mod props;

pub use error::SettlementError;
pub use machine::{check_batch_authority, required_party, transition};
pub use types::{
    BatchRow, Party, SettlementAction, SettlementRow, SettlementStatus, Transition,
};
