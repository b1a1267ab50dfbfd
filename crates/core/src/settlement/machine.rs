//! The settlement status state machine.
//!
//! Pure transition rules with no storage dependencies. Repositories resolve
//! the caller to a [`Party`] against the loaded rows, ask this module what a
//! transition does, and apply the returned effect inside their transaction.

use splitledger_shared::types::UserId;

use super::error::SettlementError;
use super::types::{BatchRow, Party, SettlementAction, SettlementStatus, Transition};

/// Returns the party entitled to trigger an action.
#[must_use]
pub const fn required_party(action: SettlementAction) -> Party {
    match action {
        SettlementAction::SubmitPayment => Party::Debtor,
        SettlementAction::MarkPaid | SettlementAction::Verify | SettlementAction::Reject => {
            Party::Creditor
        }
    }
}

/// Validates a transition and returns its effect.
///
/// | From        | Action        | Party    | Effect                          |
/// |-------------|---------------|----------|---------------------------------|
/// | pending     | MarkPaid      | creditor | paid, `paid_at` stamped         |
/// | pending     | SubmitPayment | debtor   | unconfirmed                     |
/// | unconfirmed | Verify        | creditor | paid, `paid_at` stamped         |
/// | unconfirmed | Reject        | creditor | pending, proof/method cleared   |
///
/// Authority is checked before state so that an unauthorized caller learns
/// nothing about the settlement's current status.
///
/// # Errors
///
/// `WrongParty` when the caller stands on the wrong side,
/// `InvalidTransition` when the action is not legal from `current`.
pub fn transition(
    current: SettlementStatus,
    action: SettlementAction,
    party: Party,
) -> Result<Transition, SettlementError> {
    let required = required_party(action);
    if party != required {
        return Err(SettlementError::WrongParty { action, required });
    }

    match (current, action) {
        (SettlementStatus::Pending, SettlementAction::MarkPaid) => Ok(Transition {
            next: SettlementStatus::Paid,
            stamps_paid_at: true,
            clears_payment_details: false,
        }),
        (SettlementStatus::Pending, SettlementAction::SubmitPayment) => Ok(Transition {
            next: SettlementStatus::Unconfirmed,
            stamps_paid_at: false,
            clears_payment_details: false,
        }),
        (SettlementStatus::Unconfirmed, SettlementAction::Verify) => Ok(Transition {
            next: SettlementStatus::Paid,
            stamps_paid_at: true,
            clears_payment_details: false,
        }),
        (SettlementStatus::Unconfirmed, SettlementAction::Reject) => Ok(Transition {
            next: SettlementStatus::Pending,
            stamps_paid_at: false,
            clears_payment_details: true,
        }),
        (from, action) => Err(SettlementError::InvalidTransition { from, action }),
    }
}

/// Validates that one caller holds the authority for every row of a batch.
///
/// Creditor-side actions require the caller to be the expense payer on every
/// row; `SubmitPayment` requires the caller to owe every row. Mismatched
/// batches are rejected wholesale before any row is mutated.
///
/// # Errors
///
/// `EmptyBatch` for an empty id set, `MixedBatchAuthority` when any row's
/// authority differs from the caller.
pub fn check_batch_authority(
    rows: &[BatchRow],
    actor: UserId,
    action: SettlementAction,
) -> Result<(), SettlementError> {
    if rows.is_empty() {
        return Err(SettlementError::EmptyBatch);
    }

    let required = required_party(action);
    let authorized = match required {
        Party::Creditor => rows.iter().all(|row| row.creditor == actor),
        Party::Debtor => rows.iter().all(|row| row.debtor == actor),
    };

    if authorized {
        Ok(())
    } else {
        Err(SettlementError::MixedBatchAuthority { required })
    }
}
