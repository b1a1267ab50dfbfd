//! Team roles and membership-driven recalculation planning.
//!
//! When membership changes, outstanding obligations are re-derived against
//! the new team size. The planner in this module turns a snapshot of the
//! affected expenses into a validated batch of settlement mutations; the
//! member repository applies the whole batch in one transaction.

pub mod error;
pub mod recalc;
pub mod types;

#[cfg(test)]
mod props;

pub use error::MembershipError;
pub use recalc::{
    AdditionTrigger, ExpenseSnapshot, NewSettlement, RecalcCounts, RecalcPlan,
    SettlementSnapshot, plan_maintenance, plan_member_addition,
};
pub use types::{MemberSnapshot, TeamRole, check_removal};
