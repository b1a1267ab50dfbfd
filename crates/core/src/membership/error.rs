//! Membership and recalculation errors.

use splitledger_shared::types::{ExpenseId, UserId};
use thiserror::Error;

use crate::split::SplitError;

/// Errors raised by membership invariants and recalculation planning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    /// The user is not on the team roster.
    #[error("User {0} is not a member of the team")]
    UnknownMember(UserId),

    /// Removal would leave members without any administrator.
    #[error("Cannot remove {0}: the team would be left without an administrator")]
    LastAdmin(UserId),

    /// Split arithmetic failed while planning.
    #[error(transparent)]
    Split(#[from] SplitError),

    /// A plan would create two settlements for the same (expense, member) pair.
    #[error("Duplicate settlement planned for expense {expense} and user {user}")]
    DuplicatePair {
        /// The affected expense.
        expense: ExpenseId,
        /// The member owing twice.
        user: UserId,
    },

    /// A plan carries a non-positive share.
    #[error("Planned share for expense {0} is not positive")]
    NonPositiveShare(ExpenseId),

    /// Maintenance recalculation requires at least one active member.
    #[error("Maintenance recalculation requires at least one active member")]
    NoActiveMembers,
}
