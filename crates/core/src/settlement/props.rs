//! Property-based tests for the settlement state machine.

use proptest::prelude::*;

use super::machine::{required_party, transition};
use super::types::{Party, SettlementAction, SettlementStatus};

fn status_strategy() -> impl Strategy<Value = SettlementStatus> {
    prop_oneof![
        Just(SettlementStatus::Pending),
        Just(SettlementStatus::Unconfirmed),
        Just(SettlementStatus::Paid),
    ]
}

fn action_strategy() -> impl Strategy<Value = SettlementAction> {
    prop_oneof![
        Just(SettlementAction::MarkPaid),
        Just(SettlementAction::SubmitPayment),
        Just(SettlementAction::Verify),
        Just(SettlementAction::Reject),
    ]
}

fn party_strategy() -> impl Strategy<Value = Party> {
    prop_oneof![Just(Party::Creditor), Just(Party::Debtor)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The wrong party is always rejected, regardless of status.
    #[test]
    fn prop_wrong_party_always_rejected(
        status in status_strategy(),
        action in action_strategy(),
    ) {
        let wrong = match required_party(action) {
            Party::Creditor => Party::Debtor,
            Party::Debtor => Party::Creditor,
        };
        prop_assert!(transition(status, action, wrong).is_err());
    }

    /// `Paid` is terminal: no action leaves it.
    #[test]
    fn prop_paid_is_terminal(
        action in action_strategy(),
        party in party_strategy(),
    ) {
        prop_assert!(transition(SettlementStatus::Paid, action, party).is_err());
    }

    /// `paid_at` is stamped exactly when a transition lands on `Paid`.
    #[test]
    fn prop_paid_at_iff_reaching_paid(
        status in status_strategy(),
        action in action_strategy(),
    ) {
        if let Ok(t) = transition(status, action, required_party(action)) {
            prop_assert_eq!(t.stamps_paid_at, t.next == SettlementStatus::Paid);
        }
    }

    /// Payment details are cleared only by the reject revert.
    #[test]
    fn prop_only_reject_clears_details(
        status in status_strategy(),
        action in action_strategy(),
    ) {
        if let Ok(t) = transition(status, action, required_party(action)) {
            prop_assert_eq!(
                t.clears_payment_details,
                action == SettlementAction::Reject
            );
        }
    }
}
