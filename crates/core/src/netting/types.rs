//! Domain types for settlement agreements.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use splitledger_shared::types::{SettlementId, UserId};

/// Payment-method tag recorded on settlements cancelled by netting.
pub const NETTING_METHOD: &str = "netted";

/// Lifecycle status of a settlement agreement.
///
/// An agreement is resolved exactly once; both resolved states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementStatus {
    /// Proposed and awaiting the responder's decision.
    Proposed,
    /// Accepted; the pinned settlements were cancelled.
    Accepted,
    /// Rejected; no ledger effect.
    Rejected,
}

impl AgreementStatus {
    /// Parse a status from its storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "proposed" => Some(Self::Proposed),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns the storage representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    /// Whether the agreement has been resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

/// Reciprocal obligations between the user and one counterparty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutualDebt {
    /// The other member.
    pub counterparty: UserId,
    /// Total the user owes the counterparty (pending only).
    pub user_owes: Decimal,
    /// Total the counterparty owes the user (pending only).
    pub counterparty_owes: Decimal,
    /// The user's pending settlements toward the counterparty.
    pub user_settlements: Vec<SettlementId>,
    /// The counterparty's pending settlements toward the user.
    pub counterparty_settlements: Vec<SettlementId>,
}

/// The immutable content of an agreement, as pinned at proposal time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgreementSnapshot {
    /// The proposing member.
    pub proposer: UserId,
    /// The responding member.
    pub responder: UserId,
    /// Total the proposer owes across the pinned settlements.
    pub proposer_owes: Decimal,
    /// Total the responder owes across the pinned settlements.
    pub responder_owes: Decimal,
    /// The exact settlements being netted.
    pub settlements: Vec<SettlementId>,
}

/// One settlement mutation produced by an accepted agreement.
///
/// Every pinned settlement transitions to `paid` with `paid_at` stamped and
/// the method tag set to [`NETTING_METHOD`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NettingMutation {
    /// The settlement being cancelled.
    pub settlement: SettlementId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agreement_status_round_trip() {
        for status in [
            AgreementStatus::Proposed,
            AgreementStatus::Accepted,
            AgreementStatus::Rejected,
        ] {
            assert_eq!(AgreementStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AgreementStatus::parse("open"), None);
    }

    #[test]
    fn test_resolution_is_terminal() {
        assert!(!AgreementStatus::Proposed.is_resolved());
        assert!(AgreementStatus::Accepted.is_resolved());
        assert!(AgreementStatus::Rejected.is_resolved());
    }
}
