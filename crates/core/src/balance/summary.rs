//! Balance summary computation.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use splitledger_shared::types::UserId;

use crate::settlement::{SettlementRow, SettlementStatus};

/// A directional total with its distinct counterparty count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectionTotal {
    /// Sum of amounts owed in this direction.
    pub total: Decimal,
    /// Number of distinct counterparties contributing to the total.
    pub counterparties: usize,
}

/// Net amounts owed between a user and the rest of the team.
///
/// The headline figures cover `pending` rows only. Amounts sitting in
/// `unconfirmed` are tracked separately: a submitted-but-unverified payment
/// is excluded from the hard owed figure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BalanceSummary {
    /// Pending amounts the user owes.
    pub you_owe: DirectionTotal,
    /// Pending amounts owed to the user on expenses they paid.
    pub owed_to_you: DirectionTotal,
    /// The user's submitted payments awaiting verification.
    pub awaiting_your_verification_sent: Decimal,
    /// Payments to the user awaiting their verification.
    pub awaiting_your_verification_received: Decimal,
}

/// Folds live settlement rows into a [`BalanceSummary`] for one user.
///
/// Deleted rows must already be filtered out at the storage boundary; this
/// function trusts its input to be the live set.
#[must_use]
pub fn summarize(user: UserId, rows: &[SettlementRow]) -> BalanceSummary {
    let mut summary = BalanceSummary::default();
    let mut owe_parties: BTreeSet<UserId> = BTreeSet::new();
    let mut owed_parties: BTreeSet<UserId> = BTreeSet::new();

    for row in rows {
        match row.status {
            SettlementStatus::Pending => {
                if row.debtor == user {
                    summary.you_owe.total += row.amount;
                    owe_parties.insert(row.creditor);
                } else if row.creditor == user {
                    summary.owed_to_you.total += row.amount;
                    owed_parties.insert(row.debtor);
                }
            }
            SettlementStatus::Unconfirmed => {
                if row.debtor == user {
                    summary.awaiting_your_verification_sent += row.amount;
                } else if row.creditor == user {
                    summary.awaiting_your_verification_received += row.amount;
                }
            }
            SettlementStatus::Paid => {}
        }
    }

    summary.you_owe.counterparties = owe_parties.len();
    summary.owed_to_you.counterparties = owed_parties.len();
    summary
}
