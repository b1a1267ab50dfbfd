//! Property-based tests for the split calculators.

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::calculator::{due_dates, even_share, installment_plan};

/// Strategy to generate positive decimal amounts (0.01 to 100,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate valid month counts.
fn month_count() -> impl Strategy<Value = u32> {
    1u32..=24
}

/// Strategy to generate plausible team sizes.
fn team_size() -> impl Strategy<Value = usize> {
    1usize..=50
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// An even share times the member count reconstructs the amount up to
    /// decimal division precision.
    #[test]
    fn prop_even_share_conserves_amount(
        amount in positive_amount(),
        n in team_size(),
    ) {
        let share = even_share(amount, n).unwrap();
        let reconstructed = share * Decimal::from(n as u64);
        let delta = (reconstructed - amount).abs();
        prop_assert!(delta < Decimal::new(1, 10), "delta {delta} too large");
    }

    /// Shares are always positive for valid inputs.
    #[test]
    fn prop_even_share_positive(
        amount in positive_amount(),
        n in team_size(),
    ) {
        prop_assert!(even_share(amount, n).unwrap() > Decimal::ZERO);
    }

    /// The round-up policy never under-collects: monthly amounts cover the
    /// total and per-participant amounts cover the monthly amount.
    #[test]
    fn prop_installments_never_under_collect(
        total in positive_amount(),
        months in month_count(),
        n in team_size(),
    ) {
        let plan = installment_plan(total, months, n).unwrap();
        prop_assert!(plan.monthly_amount * Decimal::from(months) >= total);
        prop_assert!(plan.per_participant * Decimal::from(n as u64) >= plan.monthly_amount);
    }

    /// Installment amounts are whole currency units.
    #[test]
    fn prop_installment_amounts_are_integral(
        total in positive_amount(),
        months in month_count(),
        n in team_size(),
    ) {
        let plan = installment_plan(total, months, n).unwrap();
        prop_assert_eq!(plan.monthly_amount, plan.monthly_amount.trunc());
        prop_assert_eq!(plan.per_participant, plan.per_participant.trunc());
    }

    /// Every derived due date lands on the requested day or the target
    /// month's last day, whichever comes first, one month apart.
    #[test]
    fn prop_due_dates_clamped_and_monthly(
        year in 2020i32..2035,
        month in 1u32..=12,
        day in 1u32..=28,
        months in month_count(),
        due_day in 1u32..=31,
    ) {
        let recorded = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        let dates = due_dates(recorded, months, due_day).unwrap();
        prop_assert_eq!(dates.len(), months as usize);

        for (offset, date) in (1..).zip(&dates) {
            let expected_month0 = (recorded.month0() + offset) % 12;
            prop_assert_eq!(date.month0(), expected_month0);
            prop_assert!(date.day() <= due_day);
            if date.day() < due_day {
                // Clamped: the following day would leave the month.
                prop_assert!(date.succ_opt().unwrap().month0() != date.month0());
            }
        }
    }
}
