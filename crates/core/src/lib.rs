//! Core ledger logic for Splitledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, calculation rules, and mutation planners live here.
//!
//! # Modules
//!
//! - `split` - Even and installment split arithmetic
//! - `settlement` - Settlement status state machine and batch authority
//! - `membership` - Team roles and membership-driven recalculation planning
//! - `balance` - Net balance aggregation over live settlement rows
//! - `netting` - Mutual-debt detection and settlement agreement resolution

pub mod balance;
pub mod membership;
pub mod netting;
pub mod settlement;
pub mod split;
