//! Domain types for settlement state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use splitledger_shared::types::{ExpenseId, SettlementId, UserId};

/// Lifecycle status of a settlement.
///
/// A rejected payment attempt maps back to `Pending` rather than a distinct
/// terminal state; the dispute itself survives in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    /// Obligation recorded, no payment attempted.
    Pending,
    /// Debtor submitted a payment awaiting the creditor's verification.
    Unconfirmed,
    /// Creditor confirmed the payment (or the debts were netted).
    Paid,
}

impl SettlementStatus {
    /// Parse a status from its storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "unconfirmed" => Some(Self::Unconfirmed),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }

    /// Returns the storage representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Unconfirmed => "unconfirmed",
            Self::Paid => "paid",
        }
    }

    /// Returns true when money has been tendered or attested on this row.
    ///
    /// Such rows are never retroactively changed by recalculation.
    #[must_use]
    pub const fn is_resolved_or_attested(&self) -> bool {
        matches!(self, Self::Unconfirmed | Self::Paid)
    }
}

/// Which side of a settlement an actor stands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    /// The payer of the underlying expense.
    Creditor,
    /// The member owing the settlement.
    Debtor,
}

/// A status transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementAction {
    /// Creditor records the debt as settled directly.
    MarkPaid,
    /// Debtor submits a payment with method and optional proof.
    SubmitPayment,
    /// Creditor verifies a submitted payment.
    Verify,
    /// Creditor rejects a submitted payment.
    Reject,
}

impl SettlementAction {
    /// Stable tag used in audit entries.
    #[must_use]
    pub const fn audit_tag(&self) -> &'static str {
        match self {
            Self::MarkPaid => "settlement.marked_paid",
            Self::SubmitPayment => "settlement.submitted",
            Self::Verify => "settlement.verified",
            Self::Reject => "settlement.rejected",
        }
    }
}

/// The effect of a legal transition on a settlement row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Status after the transition.
    pub next: SettlementStatus,
    /// Whether `paid_at` is stamped with the transition time.
    pub stamps_paid_at: bool,
    /// Whether proof reference and payment method are cleared.
    pub clears_payment_details: bool,
}

/// A read-model settlement row with both parties resolved.
///
/// Shared by the balance aggregator and the mutual settlement negotiator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRow {
    /// Settlement id.
    pub settlement: SettlementId,
    /// The expense the settlement belongs to.
    pub expense: ExpenseId,
    /// Payer of the underlying expense.
    pub creditor: UserId,
    /// Member owing the settlement.
    pub debtor: UserId,
    /// Current status.
    pub status: SettlementStatus,
    /// Amount owed.
    pub amount: Decimal,
}

/// Authority data for one row of a batch transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRow {
    /// Settlement id.
    pub settlement: SettlementId,
    /// Payer of the underlying expense.
    pub creditor: UserId,
    /// Member owing the settlement.
    pub debtor: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            SettlementStatus::Pending,
            SettlementStatus::Unconfirmed,
            SettlementStatus::Paid,
        ] {
            assert_eq!(SettlementStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SettlementStatus::parse("rejected"), None);
    }

    #[test]
    fn test_resolved_or_attested() {
        assert!(!SettlementStatus::Pending.is_resolved_or_attested());
        assert!(SettlementStatus::Unconfirmed.is_resolved_or_attested());
        assert!(SettlementStatus::Paid.is_resolved_or_attested());
    }

    #[test]
    fn test_audit_tags_are_stable() {
        assert_eq!(
            SettlementAction::MarkPaid.audit_tag(),
            "settlement.marked_paid"
        );
        assert_eq!(SettlementAction::Reject.audit_tag(), "settlement.rejected");
    }
}
