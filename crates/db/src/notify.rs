//! Notification boundary.
//!
//! Delivery is an external collaborator: the ledger hands a recipient and a
//! payload over this trait after a successful commit and never waits for or
//! surfaces the outcome. Failures are logged and swallowed.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use splitledger_shared::types::{TeamId, UserId};
use thiserror::Error;

/// What happened, from the recipient's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// A share of a new expense was assigned to the recipient.
    ShareAssigned,
    /// The debtor submitted a payment for the recipient to verify.
    PaymentSubmitted,
    /// The creditor verified the recipient's payment.
    PaymentVerified,
    /// The creditor rejected the recipient's payment.
    PaymentRejected,
    /// The creditor marked the recipient's debt as settled directly.
    MarkedPaid,
    /// A netting agreement was proposed to the recipient.
    AgreementProposed,
    /// The recipient's netting agreement was resolved.
    AgreementResolved,
}

/// Payload handed to the notification collaborator.
#[derive(Debug, Clone)]
pub struct NotificationPayload {
    /// The team the event happened in.
    pub team: TeamId,
    /// What happened.
    pub kind: NotificationKind,
    /// The amount involved, when one applies.
    pub amount: Option<Decimal>,
    /// Human-readable description (expense category, note, counterparty).
    pub detail: String,
}

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The collaborator failed to deliver.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// The notification collaborator interface.
///
/// Implementations resolve the recipient's address themselves; the ledger
/// only knows user ids.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one notification. Best effort; the ledger ignores errors.
    async fn notify(
        &self,
        recipient: UserId,
        payload: NotificationPayload,
    ) -> Result<(), NotifyError>;
}

/// In-tree notifier that records deliveries in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient: UserId,
        payload: NotificationPayload,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            %recipient,
            team = %payload.team,
            kind = ?payload.kind,
            amount = ?payload.amount,
            detail = %payload.detail,
            "notification"
        );
        Ok(())
    }
}

/// Fire-and-forget dispatch, called only after a successful commit.
///
/// Runs outside the transaction boundary; a failure can never roll back or
/// block the ledger mutation it follows.
pub(crate) fn dispatch(
    notifier: &Arc<dyn Notifier>,
    recipient: UserId,
    payload: NotificationPayload,
) {
    let notifier = Arc::clone(notifier);
    tokio::spawn(async move {
        if let Err(err) = notifier.notify(recipient, payload).await {
            tracing::warn!(%recipient, error = %err, "notification dropped");
        }
    });
}
