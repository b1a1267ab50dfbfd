//! Mutual-debt detection.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use splitledger_shared::types::UserId;

use super::types::MutualDebt;
use crate::settlement::{SettlementRow, SettlementStatus};

/// Scans the user's pending settlements in both directions and groups them
/// by counterparty.
///
/// Only counterparties with nonzero obligations in *both* directions are
/// returned, each carrying the exact settlement ids on each side. Results
/// are ordered by counterparty id for deterministic output.
#[must_use]
pub fn detect_mutual_debts(user: UserId, rows: &[SettlementRow]) -> Vec<MutualDebt> {
    let mut by_counterparty: BTreeMap<UserId, MutualDebt> = BTreeMap::new();

    for row in rows {
        if row.status != SettlementStatus::Pending {
            continue;
        }

        let (counterparty, user_side) = if row.debtor == user {
            (row.creditor, true)
        } else if row.creditor == user {
            (row.debtor, false)
        } else {
            continue;
        };

        let entry = by_counterparty
            .entry(counterparty)
            .or_insert_with(|| MutualDebt {
                counterparty,
                user_owes: Decimal::ZERO,
                counterparty_owes: Decimal::ZERO,
                user_settlements: Vec::new(),
                counterparty_settlements: Vec::new(),
            });

        if user_side {
            entry.user_owes += row.amount;
            entry.user_settlements.push(row.settlement);
        } else {
            entry.counterparty_owes += row.amount;
            entry.counterparty_settlements.push(row.settlement);
        }
    }

    by_counterparty
        .into_values()
        .filter(|debt| debt.user_owes > Decimal::ZERO && debt.counterparty_owes > Decimal::ZERO)
        .collect()
}
