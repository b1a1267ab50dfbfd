//! Pure split calculators.
//!
//! These functions are stateless and deterministic. The expense ledger and
//! the membership recalculator both derive per-member obligations here, so
//! the arithmetic lives in exactly one place.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::error::SplitError;

/// Upper bound on the number of installment months.
pub const MAX_INSTALLMENT_MONTHS: u32 = 24;

/// A validated installment plan.
///
/// Both derived amounts round **up**, never down: the sum collected across
/// all installments and participants is never less than the original cost.
/// The excess is an accepted rounding surplus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallmentPlan {
    /// Total plan amount.
    pub total_amount: Decimal,
    /// Number of monthly installments.
    pub months: u32,
    /// Amount of each child expense: `ceil(total / months)`.
    pub monthly_amount: Decimal,
    /// Share owed by each non-payer member per installment:
    /// `ceil(monthly / member_count)`.
    pub per_participant: Decimal,
}

/// Computes the even-split share for one member.
///
/// Each of the `member_count` members' raw share is `amount / member_count`
/// at full decimal precision; no rounding is applied. The payer absorbs
/// their own share as part of having paid, so callers create settlement
/// rows only for the `member_count - 1` non-payer members.
///
/// # Errors
///
/// Returns `SplitError::NonPositiveAmount` if `amount <= 0` and
/// `SplitError::NoMembers` if `member_count == 0`.
pub fn even_share(amount: Decimal, member_count: usize) -> Result<Decimal, SplitError> {
    if amount <= Decimal::ZERO {
        return Err(SplitError::NonPositiveAmount);
    }
    if member_count == 0 {
        return Err(SplitError::NoMembers);
    }

    Ok(amount / Decimal::from(member_count as u64))
}

/// Computes a validated installment plan.
///
/// `monthly_amount = ceil(total / months)` and
/// `per_participant = ceil(monthly_amount / member_count)`, both rounded up
/// to whole currency units.
///
/// # Errors
///
/// Returns a validation error for a non-positive total, a month count
/// outside `1..=24`, or an empty team.
pub fn installment_plan(
    total_amount: Decimal,
    months: u32,
    member_count: usize,
) -> Result<InstallmentPlan, SplitError> {
    if total_amount <= Decimal::ZERO {
        return Err(SplitError::NonPositiveAmount);
    }
    if months == 0 || months > MAX_INSTALLMENT_MONTHS {
        return Err(SplitError::MonthCountOutOfRange(months));
    }
    if member_count == 0 {
        return Err(SplitError::NoMembers);
    }

    let monthly_amount = (total_amount / Decimal::from(months)).ceil();
    let per_participant = (monthly_amount / Decimal::from(member_count as u64)).ceil();

    Ok(InstallmentPlan {
        total_amount,
        months,
        monthly_amount,
        per_participant,
    })
}

/// Derives one due date per installment.
///
/// The first installment falls due in the calendar month after
/// `recorded_on`, subsequent installments in consecutive months.
/// `due_day` is clamped to the target month's last day when it exceeds it
/// (a plan due on the 31st falls due on Feb 28/29 in February).
///
/// # Errors
///
/// Returns a validation error for a month count outside `1..=24` or a due
/// day outside `1..=31`.
pub fn due_dates(
    recorded_on: NaiveDate,
    months: u32,
    due_day: u32,
) -> Result<Vec<NaiveDate>, SplitError> {
    if months == 0 || months > MAX_INSTALLMENT_MONTHS {
        return Err(SplitError::MonthCountOutOfRange(months));
    }
    if due_day == 0 || due_day > 31 {
        return Err(SplitError::DueDayOutOfRange(due_day));
    }

    let mut dates = Vec::with_capacity(months as usize);
    for offset in 1..=months {
        let total_months = recorded_on.month0() + offset;
        let year = recorded_on.year() + i32::try_from(total_months / 12).unwrap_or(0);
        let month = total_months % 12 + 1;
        let day = due_day.min(last_day_of_month(year, month));

        // Valid by construction: day is clamped into the target month.
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(SplitError::DueDayOutOfRange(due_day))?;
        dates.push(date);
    }

    Ok(dates)
}

/// Returns the number of days in the given month.
fn last_day_of_month(year: i32, month: u32) -> u32 {
    (28..=31)
        .rev()
        .find(|&day| NaiveDate::from_ymd_opt(year, month, day).is_some())
        .unwrap_or(28)
}
