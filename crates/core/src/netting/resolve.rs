//! Agreement validation and resolution.
//!
//! The policy encoded here is full cancellation: acceptance marks both
//! sides' pinned settlements paid in their entirety, with no residual
//! settlement minted for the directional difference. The ledger only
//! cancels recorded obligations.

use rust_decimal::Decimal;
use splitledger_shared::types::SettlementId;

use super::error::NettingError;
use super::types::{AgreementSnapshot, NettingMutation};
use crate::settlement::{SettlementRow, SettlementStatus};

/// Validates an agreement against the live rows it pins.
///
/// Used both at proposal time and again inside the acceptance transaction:
/// a pin that changed state between the two is a conflict, not a silent
/// partial application.
///
/// # Errors
///
/// Returns the first violated agreement invariant; see [`NettingError`].
pub fn validate_proposal(
    agreement: &AgreementSnapshot,
    pinned: &[SettlementRow],
) -> Result<(), NettingError> {
    if agreement.proposer == agreement.responder {
        return Err(NettingError::SelfAgreement);
    }
    if agreement.proposer_owes <= Decimal::ZERO || agreement.responder_owes <= Decimal::ZERO {
        return Err(NettingError::NothingToNet);
    }

    let mut proposer_total = Decimal::ZERO;
    let mut responder_total = Decimal::ZERO;

    for id in &agreement.settlements {
        let row = pinned
            .iter()
            .find(|r| r.settlement == *id)
            .ok_or(NettingError::MissingSettlement(*id))?;

        if row.status != SettlementStatus::Pending {
            return Err(NettingError::SettlementNotPending(*id));
        }

        if row.debtor == agreement.proposer && row.creditor == agreement.responder {
            proposer_total += row.amount;
        } else if row.debtor == agreement.responder && row.creditor == agreement.proposer {
            responder_total += row.amount;
        } else {
            return Err(NettingError::ForeignSettlement(*id));
        }
    }

    if proposer_total != agreement.proposer_owes {
        return Err(NettingError::TotalsMismatch(agreement.proposer));
    }
    if responder_total != agreement.responder_owes {
        return Err(NettingError::TotalsMismatch(agreement.responder));
    }

    Ok(())
}

/// Produces the settlement mutations an accepted agreement applies.
///
/// Re-validates the pins first, then emits exactly one mutation per pinned
/// settlement. Nothing outside the pin set is ever touched.
///
/// # Errors
///
/// As [`validate_proposal`].
pub fn resolution(
    agreement: &AgreementSnapshot,
    pinned: &[SettlementRow],
) -> Result<Vec<NettingMutation>, NettingError> {
    validate_proposal(agreement, pinned)?;

    Ok(agreement
        .settlements
        .iter()
        .map(|id| NettingMutation { settlement: *id })
        .collect())
}

/// Total ledger value a mutation set cancels, per side.
///
/// Helper for conservation checks: the cancelled totals must equal the
/// agreement's pinned totals exactly.
#[must_use]
pub fn cancelled_totals(
    agreement: &AgreementSnapshot,
    pinned: &[SettlementRow],
    mutations: &[NettingMutation],
) -> (Decimal, Decimal) {
    let ids: Vec<SettlementId> = mutations.iter().map(|m| m.settlement).collect();
    let mut proposer_total = Decimal::ZERO;
    let mut responder_total = Decimal::ZERO;

    for row in pinned {
        if !ids.contains(&row.settlement) {
            continue;
        }
        if row.debtor == agreement.proposer {
            proposer_total += row.amount;
        } else if row.debtor == agreement.responder {
            responder_total += row.amount;
        }
    }

    (proposer_total, responder_total)
}
