//! Agreement repository: the mutual settlement negotiator.
//!
//! Detects reciprocal obligations, persists proposals that pin the exact
//! settlements being netted, and resolves them exactly once. Acceptance
//! re-validates every pin inside its transaction; a pin that changed state
//! since the proposal fails the whole acceptance.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use splitledger_core::netting::{
    self, AgreementSnapshot, MutualDebt, NETTING_METHOD, NettingError,
};
use splitledger_core::settlement::SettlementRow;
use splitledger_shared::types::{AgreementId, SettlementId, TeamId, UserId};
use uuid::Uuid;

use super::activity::ActivityRepository;
use super::scope;
use crate::entities::{expenses, settlement_agreements, settlements};
use crate::notify::{self, LogNotifier, NotificationKind, NotificationPayload, Notifier};

/// Error types for agreement operations.
#[derive(Debug, thiserror::Error)]
pub enum AgreementError {
    /// A party is not a member of the team.
    #[error("User {0} is not a member of the team")]
    NotTeamMember(UserId),

    /// Agreement not found.
    #[error("Agreement not found: {0}")]
    NotFound(AgreementId),

    /// Only the responder may resolve an agreement.
    #[error("User {0} is not the responder of this agreement")]
    NotResponder(UserId),

    /// The proposal does not match the settlements it pins.
    #[error("Invalid proposal: {0}")]
    InvalidProposal(#[source] NettingError),

    /// A pinned settlement changed state between proposal and acceptance.
    #[error("Agreement is stale: {0}")]
    StalePins(#[source] NettingError),

    /// The stored settlement id list cannot be decoded.
    #[error("Agreement {0} has corrupt settlement ids")]
    CorruptPins(AgreementId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AgreementError> for splitledger_shared::AppError {
    fn from(err: AgreementError) -> Self {
        match &err {
            AgreementError::NotTeamMember(_) | AgreementError::NotResponder(_) => {
                Self::Forbidden(err.to_string())
            }
            AgreementError::NotFound(_) => Self::NotFound(err.to_string()),
            AgreementError::InvalidProposal(_) => Self::InvalidInput(err.to_string()),
            AgreementError::StalePins(_) => Self::Conflict(err.to_string()),
            AgreementError::CorruptPins(_) => Self::Internal(err.to_string()),
            AgreementError::Database(_) => Self::Database(err.to_string()),
        }
    }
}

/// Agreement repository.
#[derive(Clone)]
pub struct AgreementRepository {
    db: DatabaseConnection,
    notifier: Arc<dyn Notifier>,
}

impl AgreementRepository {
    /// Creates a new agreement repository with the logging notifier.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_notifier(db, Arc::new(LogNotifier))
    }

    /// Creates a new agreement repository with a custom notification collaborator.
    #[must_use]
    pub fn with_notifier(db: DatabaseConnection, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    /// Finds every counterparty with whom the user has pending obligations
    /// in both directions, with the exact settlement ids on each side.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is not a team member or the query fails.
    pub async fn detect_mutual_debts(
        &self,
        team: TeamId,
        user: UserId,
    ) -> Result<Vec<MutualDebt>, AgreementError> {
        if scope::find_member(&self.db, team, user).await?.is_none() {
            return Err(AgreementError::NotTeamMember(user));
        }

        let rows = scope::team_settlement_rows(&self.db, team).await?;
        Ok(netting::detect_mutual_debts(user, &rows))
    }

    /// Creates a `proposed` agreement pinning the exact settlements being
    /// netted.
    ///
    /// The claimed totals must match the pinned rows; validation happens
    /// against live state before anything is persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if either party is not a team member, the proposal
    /// fails validation, or the database fails.
    pub async fn propose(
        &self,
        team: TeamId,
        proposer: UserId,
        responder: UserId,
        proposer_owes: rust_decimal::Decimal,
        responder_owes: rust_decimal::Decimal,
        settlement_ids: Vec<SettlementId>,
    ) -> Result<settlement_agreements::Model, AgreementError> {
        for user in [proposer, responder] {
            if scope::find_member(&self.db, team, user).await?.is_none() {
                return Err(AgreementError::NotTeamMember(user));
            }
        }

        let snapshot = AgreementSnapshot {
            proposer,
            responder,
            proposer_owes,
            responder_owes,
            settlements: settlement_ids.clone(),
        };
        let rows = pinned_rows(&self.db, team, &settlement_ids)
            .await
            .map_err(|err| match err {
                PinError::Netting(inner) => AgreementError::InvalidProposal(inner),
                PinError::Database(inner) => AgreementError::Database(inner),
            })?;
        netting::validate_proposal(&snapshot, &rows).map_err(AgreementError::InvalidProposal)?;

        let raw_ids: Vec<Uuid> = settlement_ids.iter().map(|id| id.into_inner()).collect();
        let txn = self.db.begin().await?;

        let agreement = settlement_agreements::ActiveModel {
            id: Set(Uuid::now_v7()),
            team_id: Set(team.into_inner()),
            proposer: Set(proposer.into_inner()),
            responder: Set(responder.into_inner()),
            proposer_owes: Set(proposer_owes),
            responder_owes: Set(responder_owes),
            status: Set(settlement_agreements::Status::Proposed),
            settlement_ids: Set(serde_json::json!(raw_ids)),
            proposed_at: Set(Utc::now().into()),
            responded_at: Set(None),
        }
        .insert(&txn)
        .await?;

        ActivityRepository::append(
            &txn,
            team,
            proposer,
            "agreement.proposed",
            format!("net {proposer_owes} against {responder_owes} with user {responder}"),
        )
        .await?;

        txn.commit().await?;

        notify::dispatch(
            &self.notifier,
            responder,
            NotificationPayload {
                team,
                kind: NotificationKind::AgreementProposed,
                amount: Some(responder_owes),
                detail: format!("proposed by user {proposer}"),
            },
        );

        Ok(agreement)
    }

    /// Resolves an agreement: reject leaves the ledger untouched; accept
    /// transitions every pinned settlement to `paid` with the `netted`
    /// method tag, all in one transaction.
    ///
    /// Responding to an already-resolved agreement is idempotent and
    /// returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the agreement is missing, the caller is not the
    /// responder, a pin went stale, or the database fails.
    pub async fn respond(
        &self,
        id: AgreementId,
        actor: UserId,
        accept: bool,
    ) -> Result<settlement_agreements::Model, AgreementError> {
        let agreement = settlement_agreements::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(AgreementError::NotFound(id))?;

        if agreement.responder != actor.into_inner() {
            return Err(AgreementError::NotResponder(actor));
        }

        let status: netting::AgreementStatus = agreement.status.into();
        if status.is_resolved() {
            return Ok(agreement);
        }

        let team = TeamId::from_uuid(agreement.team_id);
        let proposer = UserId::from_uuid(agreement.proposer);
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let resolved = if accept {
            let raw_ids: Vec<Uuid> = serde_json::from_value(agreement.settlement_ids.clone())
                .map_err(|_| AgreementError::CorruptPins(id))?;
            let pins: Vec<SettlementId> =
                raw_ids.into_iter().map(SettlementId::from_uuid).collect();

            let snapshot = AgreementSnapshot {
                proposer,
                responder: actor,
                proposer_owes: agreement.proposer_owes,
                responder_owes: agreement.responder_owes,
                settlements: pins.clone(),
            };
            let rows = pinned_rows(&txn, team, &pins).await.map_err(|err| match err {
                PinError::Netting(inner) => AgreementError::StalePins(inner),
                PinError::Database(inner) => AgreementError::Database(inner),
            })?;
            let mutations =
                netting::resolution(&snapshot, &rows).map_err(AgreementError::StalePins)?;

            for mutation in &mutations {
                settlements::Entity::update_many()
                    .col_expr(
                        settlements::Column::Status,
                        sea_orm::sea_query::Expr::value(settlements::Status::Paid),
                    )
                    .col_expr(
                        settlements::Column::PaymentMethod,
                        sea_orm::sea_query::Expr::value(NETTING_METHOD),
                    )
                    .col_expr(
                        settlements::Column::PaidAt,
                        sea_orm::sea_query::Expr::value(
                            sea_orm::prelude::DateTimeWithTimeZone::from(now),
                        ),
                    )
                    .col_expr(
                        settlements::Column::UpdatedAt,
                        sea_orm::sea_query::Expr::value(
                            sea_orm::prelude::DateTimeWithTimeZone::from(now),
                        ),
                    )
                    .filter(settlements::Column::Id.eq(mutation.settlement.into_inner()))
                    .exec(&txn)
                    .await?;
            }

            let mut active = agreement.into_active_model();
            active.status = Set(settlement_agreements::Status::Accepted);
            active.responded_at = Set(Some(now.into()));
            let resolved = active.update(&txn).await?;

            ActivityRepository::append(
                &txn,
                team,
                actor,
                "agreement.accepted",
                format!(
                    "netted {} against {} with user {proposer}",
                    resolved.responder_owes, resolved.proposer_owes
                ),
            )
            .await?;

            resolved
        } else {
            let mut active = agreement.into_active_model();
            active.status = Set(settlement_agreements::Status::Rejected);
            active.responded_at = Set(Some(now.into()));
            let resolved = active.update(&txn).await?;

            ActivityRepository::append(
                &txn,
                team,
                actor,
                "agreement.rejected",
                format!("declined netting with user {proposer}"),
            )
            .await?;

            resolved
        };

        txn.commit().await?;

        notify::dispatch(
            &self.notifier,
            proposer,
            NotificationPayload {
                team,
                kind: NotificationKind::AgreementResolved,
                amount: None,
                detail: if accept { "accepted" } else { "rejected" }.to_string(),
            },
        );

        Ok(resolved)
    }
}

/// Pin loading failures, split so callers can classify them.
enum PinError {
    Netting(NettingError),
    Database(DbErr),
}

impl From<DbErr> for PinError {
    fn from(err: DbErr) -> Self {
        Self::Database(err)
    }
}

/// Loads the pinned settlements as read-model rows, verifying every pin
/// exists, is live, and belongs to the team.
async fn pinned_rows<C: ConnectionTrait>(
    conn: &C,
    team: TeamId,
    ids: &[SettlementId],
) -> Result<Vec<SettlementRow>, PinError> {
    let rows = scope::settlements_by_ids(conn, ids).await?;
    for id in ids {
        if !rows.iter().any(|r| r.id == id.into_inner()) {
            return Err(PinError::Netting(NettingError::MissingSettlement(*id)));
        }
    }

    let expense_ids: Vec<Uuid> = rows.iter().map(|r| r.expense_id).collect();
    let expense_rows = expenses::Entity::find()
        .filter(expenses::Column::Id.is_in(expense_ids))
        .filter(expenses::Column::DeletedAt.is_null())
        .all(conn)
        .await?;
    let by_id: HashMap<Uuid, &expenses::Model> = expense_rows.iter().map(|e| (e.id, e)).collect();

    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        let settlement = SettlementId::from_uuid(row.id);
        let expense = by_id
            .get(&row.expense_id)
            .ok_or(PinError::Netting(NettingError::MissingSettlement(settlement)))?;
        if expense.team_id != team.into_inner() {
            return Err(PinError::Netting(NettingError::ForeignSettlement(settlement)));
        }
        result.push(SettlementRow {
            settlement,
            expense: splitledger_shared::types::ExpenseId::from_uuid(expense.id),
            creditor: UserId::from_uuid(expense.payer),
            debtor: UserId::from_uuid(row.owed_by),
            status: row.status.into(),
            amount: row.amount_owed,
        });
    }

    Ok(result)
}
