//! Netting and agreement errors.

use splitledger_shared::types::{SettlementId, UserId};
use thiserror::Error;

/// Errors raised while validating or resolving a settlement agreement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NettingError {
    /// Proposer and responder must be different members.
    #[error("An agreement requires two distinct members")]
    SelfAgreement,

    /// A pinned settlement is missing from the live rows.
    #[error("Pinned settlement {0} no longer exists")]
    MissingSettlement(SettlementId),

    /// A pinned settlement is no longer pending.
    #[error("Pinned settlement {0} is no longer pending")]
    SettlementNotPending(SettlementId),

    /// A pinned settlement does not run between the two parties.
    #[error("Settlement {0} is not between the agreement's parties")]
    ForeignSettlement(SettlementId),

    /// The claimed totals do not match the pinned rows.
    #[error("Claimed totals do not match the pinned settlements for {0}")]
    TotalsMismatch(UserId),

    /// There is nothing to net in one of the directions.
    #[error("Both parties must owe a nonzero amount")]
    NothingToNet,
}
