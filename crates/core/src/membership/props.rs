//! Property-based tests for the recalculation planner.

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;
use rust_decimal::Decimal;
use splitledger_shared::types::{ExpenseId, SettlementId, UserId};

use super::recalc::{
    AdditionTrigger, ExpenseSnapshot, SettlementSnapshot, plan_maintenance, plan_member_addition,
};
use crate::settlement::SettlementStatus;
use crate::split::even_share;

fn status_strategy() -> impl Strategy<Value = SettlementStatus> {
    prop_oneof![
        3 => Just(SettlementStatus::Pending),
        1 => Just(SettlementStatus::Unconfirmed),
        1 => Just(SettlementStatus::Paid),
    ]
}

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// A team snapshot: a pool of users, and expenses whose payer and debtors
/// are drawn from the pool.
fn team_strategy() -> impl Strategy<Value = (Vec<UserId>, Vec<ExpenseSnapshot>)> {
    (2usize..=6).prop_flat_map(|pool_size| {
        let users: Vec<UserId> = (0..pool_size).map(|_| UserId::new()).collect();
        let users_for_expenses = users.clone();

        let expense = (
            0..pool_size,
            amount_strategy(),
            proptest::collection::vec((0..pool_size, status_strategy(), amount_strategy()), 0..5),
        )
            .prop_map(move |(payer_ix, amount, rows)| {
                let payer = users_for_expenses[payer_ix];
                let mut seen = HashSet::new();
                let settlements = rows
                    .into_iter()
                    .filter_map(|(debtor_ix, status, row_amount)| {
                        let debtor = users_for_expenses[debtor_ix];
                        // One row per (expense, member); the payer never owes.
                        (debtor != payer && seen.insert(debtor)).then_some(SettlementSnapshot {
                            id: SettlementId::new(),
                            owed_by: debtor,
                            status,
                            amount: row_amount,
                        })
                    })
                    .collect();
                ExpenseSnapshot {
                    id: ExpenseId::new(),
                    payer,
                    amount,
                    settlements,
                }
            });

        (
            Just(users),
            proptest::collection::vec(expense, 0..6),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// A member addition never touches attested or paid rows, updates every
    /// pending row on affected expenses to the new even share, and inserts
    /// at most one row per expense, always for the joiner.
    #[test]
    fn prop_member_addition_invariants(
        (users, expenses) in team_strategy(),
        trigger in prop_oneof![Just(AdditionTrigger::Join), Just(AdditionTrigger::AdminAdd)],
    ) {
        let joiner = UserId::new();
        let new_count = users.len() + 1;
        let plan = plan_member_addition(&expenses, joiner, new_count, trigger).unwrap();

        let updated: HashSet<SettlementId> = plan.updates.iter().map(|(id, _)| *id).collect();
        prop_assert!(plan.deletes.is_empty());

        for expense in &expenses {
            let skipped = !expense.has_pending()
                || (trigger == AdditionTrigger::Join && expense.payer == joiner);
            let share = even_share(expense.amount, new_count).unwrap();

            for settlement in &expense.settlements {
                if settlement.status == SettlementStatus::Pending && !skipped {
                    prop_assert!(updated.contains(&settlement.id));
                } else {
                    prop_assert!(!updated.contains(&settlement.id));
                }
            }

            let inserts_here: Vec<_> = plan
                .inserts
                .iter()
                .filter(|i| i.expense == expense.id)
                .collect();
            if skipped {
                prop_assert!(inserts_here.is_empty());
            } else {
                prop_assert!(inserts_here.len() <= 1);
                for insert in inserts_here {
                    prop_assert_eq!(insert.owed_by, joiner);
                    prop_assert_eq!(insert.amount, share);
                }
            }
        }

        for (_, amount) in &plan.updates {
            prop_assert!(*amount > Decimal::ZERO);
        }
    }

    /// Maintenance only deletes pending rows of departed users and never
    /// inserts a row for an expense's own payer.
    #[test]
    fn prop_maintenance_invariants(
        (users, expenses) in team_strategy(),
        keep_mask in proptest::collection::vec(any::<bool>(), 6),
    ) {
        // Keep a nonempty subset of the pool as the active roster.
        let mut active: BTreeSet<UserId> = users
            .iter()
            .zip(&keep_mask)
            .filter_map(|(user, keep)| keep.then_some(*user))
            .collect();
        if active.is_empty() {
            active.insert(users[0]);
        }

        let plan = plan_maintenance(&expenses, &active).unwrap();
        let deleted: HashSet<SettlementId> = plan.deletes.iter().copied().collect();

        for expense in &expenses {
            for settlement in &expense.settlements {
                if deleted.contains(&settlement.id) {
                    prop_assert_eq!(settlement.status, SettlementStatus::Pending);
                    prop_assert!(!active.contains(&settlement.owed_by));
                }
            }
        }

        for insert in &plan.inserts {
            let expense = expenses.iter().find(|e| e.id == insert.expense).unwrap();
            prop_assert!(insert.owed_by != expense.payer);
            prop_assert!(active.contains(&insert.owed_by));
        }
    }
}
