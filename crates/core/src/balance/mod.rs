//! Net balance aggregation.
//!
//! A read-only derived view over live settlement rows: what the user owes,
//! what is owed to them, and who the counterparties are. Nothing here is
//! cached; repositories fetch the rows and this module folds them.

pub mod summary;

pub use summary::{BalanceSummary, DirectionTotal, summarize};
