//! Settlement repository: applies status transitions to settlement rows.
//!
//! The legal transitions and their authority rules live in the core state
//! machine; this repository resolves the caller to a party against the
//! loaded rows, applies the returned effect, and writes the audit entry in
//! the same transaction. The counterpart is notified after commit.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use splitledger_core::settlement::{
    BatchRow, Party, SettlementAction, SettlementError as TransitionError, Transition,
    check_batch_authority, required_party, transition,
};
use splitledger_shared::types::{SettlementId, TeamId, UserId};
use uuid::Uuid;

use super::activity::ActivityRepository;
use super::scope;
use crate::entities::{expenses, settlements};
use crate::notify::{self, LogNotifier, NotificationKind, NotificationPayload, Notifier};

/// Error types for settlement operations.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    /// Settlement not found (or soft-deleted).
    #[error("Settlement not found: {0}")]
    NotFound(SettlementId),

    /// The caller is neither the creditor nor the debtor of the settlement.
    #[error("User {0} is not a party to this settlement")]
    NotParty(UserId),

    /// The state machine rejected the transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<SettlementError> for splitledger_shared::AppError {
    fn from(err: SettlementError) -> Self {
        match &err {
            SettlementError::NotFound(_) => Self::NotFound(err.to_string()),
            SettlementError::NotParty(_) => Self::Forbidden(err.to_string()),
            SettlementError::Transition(inner) => match inner {
                TransitionError::WrongParty { .. } => Self::Forbidden(err.to_string()),
                TransitionError::InvalidTransition { .. } => Self::Conflict(err.to_string()),
                TransitionError::EmptyBatch | TransitionError::MixedBatchAuthority { .. } => {
                    Self::InvalidInput(err.to_string())
                }
            },
            SettlementError::Database(_) => Self::Database(err.to_string()),
        }
    }
}

/// A settlement row joined with the expense context a transition needs.
struct RowContext {
    row: settlements::Model,
    team: TeamId,
    creditor: UserId,
    category: String,
}

/// Settlement repository.
#[derive(Clone)]
pub struct SettlementRepository {
    db: DatabaseConnection,
    notifier: Arc<dyn Notifier>,
}

impl SettlementRepository {
    /// Creates a new settlement repository with the logging notifier.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_notifier(db, Arc::new(LogNotifier))
    }

    /// Creates a new settlement repository with a custom notification collaborator.
    #[must_use]
    pub fn with_notifier(db: DatabaseConnection, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    /// Debtor submits a payment: `pending -> unconfirmed`, recording the
    /// payment method and an optional proof reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the settlement is missing, the caller is not the
    /// debtor, or the row is not pending.
    pub async fn submit_payment(
        &self,
        id: SettlementId,
        actor: UserId,
        method: &str,
        proof_reference: Option<String>,
    ) -> Result<settlements::Model, SettlementError> {
        self.apply_single(
            id,
            actor,
            SettlementAction::SubmitPayment,
            Some(method.to_string()),
            proof_reference,
        )
        .await
    }

    /// Creditor records the debt as settled directly: `pending -> paid`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settlement is missing, the caller is not the
    /// creditor, or the row is not pending.
    pub async fn mark_paid(
        &self,
        id: SettlementId,
        actor: UserId,
        method: Option<String>,
    ) -> Result<settlements::Model, SettlementError> {
        self.apply_single(id, actor, SettlementAction::MarkPaid, method, None)
            .await
    }

    /// Creditor verifies a submitted payment: `unconfirmed -> paid`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settlement is missing, the caller is not the
    /// creditor, or the row is not unconfirmed.
    pub async fn verify(
        &self,
        id: SettlementId,
        actor: UserId,
    ) -> Result<settlements::Model, SettlementError> {
        self.apply_single(id, actor, SettlementAction::Verify, None, None)
            .await
    }

    /// Creditor rejects a submitted payment: `unconfirmed -> pending`, with
    /// proof and method cleared. The dispute survives as an audit entry
    /// carrying the discarded proof reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the settlement is missing, the caller is not the
    /// creditor, or the row is not unconfirmed.
    pub async fn reject(
        &self,
        id: SettlementId,
        actor: UserId,
    ) -> Result<settlements::Model, SettlementError> {
        self.apply_single(id, actor, SettlementAction::Reject, None, None)
            .await
    }

    /// Applies the same transition to a set of settlements, all or nothing.
    ///
    /// Every row must share the caller as its single authority (the
    /// creditor of every row, or the debtor of every row, depending on the
    /// action); mismatched batches are rejected wholesale before any row is
    /// mutated, as is a batch with any row in the wrong state.
    ///
    /// # Errors
    ///
    /// Returns an error if any id is missing, the authority is mixed, or
    /// any row rejects the transition.
    pub async fn transition_batch(
        &self,
        ids: &[SettlementId],
        actor: UserId,
        action: SettlementAction,
        method: Option<String>,
        proof_reference: Option<String>,
    ) -> Result<Vec<settlements::Model>, SettlementError> {
        if ids.is_empty() {
            return Err(TransitionError::EmptyBatch.into());
        }

        let txn = self.db.begin().await?;

        let rows = scope::settlements_by_ids(&txn, ids).await?;
        for id in ids {
            if !rows.iter().any(|r| r.id == id.into_inner()) {
                return Err(SettlementError::NotFound(*id));
            }
        }

        let contexts = load_contexts(&txn, rows).await?;

        let batch: Vec<BatchRow> = contexts
            .iter()
            .map(|ctx| BatchRow {
                settlement: SettlementId::from_uuid(ctx.row.id),
                creditor: ctx.creditor,
                debtor: UserId::from_uuid(ctx.row.owed_by),
            })
            .collect();
        check_batch_authority(&batch, actor, action)?;

        // Validate every transition before mutating anything.
        let party = required_party(action);
        let mut planned = Vec::with_capacity(contexts.len());
        for ctx in contexts {
            let effect = transition(ctx.row.status.into(), action, party)?;
            planned.push((ctx, effect));
        }

        let mut updated = Vec::with_capacity(planned.len());
        let mut notifications = Vec::with_capacity(planned.len());
        for (ctx, effect) in planned {
            let (model, notification) = apply_effect(
                &txn,
                ctx,
                actor,
                action,
                effect,
                method.clone(),
                proof_reference.clone(),
            )
            .await?;
            updated.push(model);
            notifications.push(notification);
        }

        txn.commit().await?;

        for (recipient, payload) in notifications {
            notify::dispatch(&self.notifier, recipient, payload);
        }

        Ok(updated)
    }

    /// Shared single-row path.
    async fn apply_single(
        &self,
        id: SettlementId,
        actor: UserId,
        action: SettlementAction,
        method: Option<String>,
        proof_reference: Option<String>,
    ) -> Result<settlements::Model, SettlementError> {
        let txn = self.db.begin().await?;

        let row = scope::find_active_settlement(&txn, id)
            .await?
            .ok_or(SettlementError::NotFound(id))?;
        let ctx = load_context(&txn, row).await?;

        let party = if ctx.creditor == actor {
            Party::Creditor
        } else if ctx.row.owed_by == actor.into_inner() {
            Party::Debtor
        } else {
            return Err(SettlementError::NotParty(actor));
        };

        let effect = transition(ctx.row.status.into(), action, party)?;
        let (model, notification) =
            apply_effect(&txn, ctx, actor, action, effect, method, proof_reference).await?;

        txn.commit().await?;

        let (recipient, payload) = notification;
        notify::dispatch(&self.notifier, recipient, payload);

        Ok(model)
    }
}

/// Joins one settlement with its live expense.
async fn load_context<C: ConnectionTrait>(
    conn: &C,
    row: settlements::Model,
) -> Result<RowContext, SettlementError> {
    let expense = scope::find_active_expense(conn, splitledger_shared::types::ExpenseId::from_uuid(row.expense_id))
        .await?
        .ok_or(SettlementError::NotFound(SettlementId::from_uuid(row.id)))?;

    Ok(RowContext {
        team: TeamId::from_uuid(expense.team_id),
        creditor: UserId::from_uuid(expense.payer),
        category: expense.category,
        row,
    })
}

/// Joins a batch of settlements with their live expenses.
async fn load_contexts<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<settlements::Model>,
) -> Result<Vec<RowContext>, SettlementError> {
    let expense_ids: Vec<Uuid> = rows.iter().map(|r| r.expense_id).collect();
    let expense_rows = expenses::Entity::find()
        .filter(expenses::Column::Id.is_in(expense_ids))
        .filter(expenses::Column::DeletedAt.is_null())
        .all(conn)
        .await?;
    let by_id: HashMap<Uuid, &expenses::Model> =
        expense_rows.iter().map(|e| (e.id, e)).collect();

    let mut contexts = Vec::with_capacity(rows.len());
    for row in rows {
        let expense = by_id
            .get(&row.expense_id)
            .ok_or(SettlementError::NotFound(SettlementId::from_uuid(row.id)))?;
        contexts.push(RowContext {
            team: TeamId::from_uuid(expense.team_id),
            creditor: UserId::from_uuid(expense.payer),
            category: expense.category.clone(),
            row,
        });
    }
    Ok(contexts)
}

/// Applies one validated transition effect and writes its audit entry.
async fn apply_effect<C: ConnectionTrait>(
    conn: &C,
    ctx: RowContext,
    actor: UserId,
    action: SettlementAction,
    effect: Transition,
    method: Option<String>,
    proof_reference: Option<String>,
) -> Result<(settlements::Model, (UserId, NotificationPayload)), SettlementError> {
    let now = Utc::now();
    let amount = ctx.row.amount_owed;
    let debtor = UserId::from_uuid(ctx.row.owed_by);
    let discarded_proof = ctx.row.proof_reference.clone();

    let mut active = ctx.row.into_active_model();
    active.status = Set(effect.next.into());
    active.updated_at = Set(now.into());
    if effect.stamps_paid_at {
        active.paid_at = Set(Some(now.into()));
    }
    if effect.clears_payment_details {
        active.payment_method = Set(None);
        active.proof_reference = Set(None);
    } else {
        if let Some(method) = method {
            active.payment_method = Set(Some(method));
        }
        if proof_reference.is_some() {
            active.proof_reference = Set(proof_reference);
        }
    }
    let model = active.update(conn).await?;

    let detail = match action {
        SettlementAction::Reject => format!(
            "{}: {} disputed, discarded proof {}",
            ctx.category,
            amount,
            discarded_proof.as_deref().unwrap_or("(none)")
        ),
        _ => format!("{}: {}", ctx.category, amount),
    };
    ActivityRepository::append(conn, ctx.team, actor, action.audit_tag(), detail).await?;

    let (recipient, kind) = match action {
        SettlementAction::SubmitPayment => (ctx.creditor, NotificationKind::PaymentSubmitted),
        SettlementAction::MarkPaid => (debtor, NotificationKind::MarkedPaid),
        SettlementAction::Verify => (debtor, NotificationKind::PaymentVerified),
        SettlementAction::Reject => (debtor, NotificationKind::PaymentRejected),
    };
    let payload = NotificationPayload {
        team: ctx.team,
        kind,
        amount: Some(amount),
        detail: model.payment_method.clone().unwrap_or_default(),
    };

    Ok((model, (recipient, payload)))
}
