//! Split validation errors.

use thiserror::Error;

/// Errors that can occur while computing a split.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    /// Expense amount must be positive.
    #[error("Expense amount must be positive")]
    NonPositiveAmount,

    /// A split requires at least one member.
    #[error("A split requires at least one team member")]
    NoMembers,

    /// Installment month count is outside the permitted range.
    #[error("Installment month count {0} is outside 1..=24")]
    MonthCountOutOfRange(u32),

    /// Due day of month is outside the permitted range.
    #[error("Due day of month {0} is outside 1..=31")]
    DueDayOutOfRange(u32),
}
