//! Property-based tests for agreement resolution.
//!
//! The conservation property: an accepted agreement cancels exactly the
//! pinned totals on each side, and its mutation set is exactly the pinned
//! id set. No other ledger value moves.

use std::collections::BTreeSet;

use proptest::prelude::*;
use rust_decimal::Decimal;
use splitledger_shared::types::{ExpenseId, SettlementId, UserId};

use super::resolve::{cancelled_totals, resolution};
use super::types::AgreementSnapshot;
use crate::netting::detect_mutual_debts;
use crate::settlement::{SettlementRow, SettlementStatus};

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Reciprocal pending rows between two fixed parties, plus unrelated noise
/// rows that must never be touched.
fn mutual_fixture() -> impl Strategy<Value = (AgreementSnapshot, Vec<SettlementRow>)> {
    (
        proptest::collection::vec(amount_strategy(), 1..5),
        proptest::collection::vec(amount_strategy(), 1..5),
        proptest::collection::vec(amount_strategy(), 0..4),
    )
        .prop_map(|(mine, theirs, noise)| {
            let proposer = UserId::new();
            let responder = UserId::new();

            let mut rows = Vec::new();
            let mut pins = Vec::new();
            let mut proposer_owes = Decimal::ZERO;
            let mut responder_owes = Decimal::ZERO;

            for amount in mine {
                let row = SettlementRow {
                    settlement: SettlementId::new(),
                    expense: ExpenseId::new(),
                    creditor: responder,
                    debtor: proposer,
                    status: SettlementStatus::Pending,
                    amount,
                };
                proposer_owes += amount;
                pins.push(row.settlement);
                rows.push(row);
            }
            for amount in theirs {
                let row = SettlementRow {
                    settlement: SettlementId::new(),
                    expense: ExpenseId::new(),
                    creditor: proposer,
                    debtor: responder,
                    status: SettlementStatus::Pending,
                    amount,
                };
                responder_owes += amount;
                pins.push(row.settlement);
                rows.push(row);
            }
            for amount in noise {
                rows.push(SettlementRow {
                    settlement: SettlementId::new(),
                    expense: ExpenseId::new(),
                    creditor: UserId::new(),
                    debtor: UserId::new(),
                    status: SettlementStatus::Pending,
                    amount,
                });
            }

            let agreement = AgreementSnapshot {
                proposer,
                responder,
                proposer_owes,
                responder_owes,
                settlements: pins,
            };
            (agreement, rows)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Conservation: the cancelled value per side equals the agreement's
    /// pinned totals, and the mutation set is exactly the pin set.
    #[test]
    fn prop_resolution_conserves_ledger_value(
        (agreement, rows) in mutual_fixture(),
    ) {
        let mutations = resolution(&agreement, &rows).unwrap();

        let mutated: BTreeSet<SettlementId> =
            mutations.iter().map(|m| m.settlement).collect();
        let pinned: BTreeSet<SettlementId> =
            agreement.settlements.iter().copied().collect();
        prop_assert_eq!(&mutated, &pinned);

        let (proposer_total, responder_total) =
            cancelled_totals(&agreement, &rows, &mutations);
        prop_assert_eq!(proposer_total, agreement.proposer_owes);
        prop_assert_eq!(responder_total, agreement.responder_owes);
    }

    /// Detection agrees with the proposal it would feed: the totals and id
    /// sets found for the counterparty match the generated rows.
    #[test]
    fn prop_detection_matches_generated_rows(
        (agreement, rows) in mutual_fixture(),
    ) {
        let debts = detect_mutual_debts(agreement.proposer, &rows);
        let debt = debts
            .iter()
            .find(|d| d.counterparty == agreement.responder)
            .unwrap();

        prop_assert_eq!(debt.user_owes, agreement.proposer_owes);
        prop_assert_eq!(debt.counterparty_owes, agreement.responder_owes);

        let detected: BTreeSet<SettlementId> = debt
            .user_settlements
            .iter()
            .chain(&debt.counterparty_settlements)
            .copied()
            .collect();
        let pinned: BTreeSet<SettlementId> =
            agreement.settlements.iter().copied().collect();
        prop_assert_eq!(detected, pinned);
    }
}
