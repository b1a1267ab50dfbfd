//! Mutual-debt detection and settlement agreement resolution.
//!
//! When two members owe each other at the same time, the negotiator lets
//! one of them propose cancelling both sides without money changing hands.
//! This module detects the reciprocal obligations, validates a proposal
//! against the live rows it pins, and produces the exact mutations an
//! acceptance applies.

pub mod detect;
pub mod error;
pub mod resolve;
pub mod types;

#[cfg(test)]
mod props;

pub use detect::detect_mutual_debts;
pub use error::NettingError;
pub use resolve::{resolution, validate_proposal};
pub use types::{AgreementSnapshot, AgreementStatus, MutualDebt, NettingMutation, NETTING_METHOD};
