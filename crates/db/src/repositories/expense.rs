//! Expense repository: creates expenses and their settlement rows atomically.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use splitledger_core::split::{self, SplitError};
use splitledger_shared::types::{ExpenseId, TeamId, UserId};
use uuid::Uuid;

use super::activity::ActivityRepository;
use super::scope;
use crate::entities::{expenses, members, settlements};
use crate::notify::{self, LogNotifier, NotificationKind, NotificationPayload, Notifier};

/// Error types for expense operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    /// The acting user is not a member of the team.
    #[error("User {0} is not a member of the team")]
    NotTeamMember(UserId),

    /// Expense not found (or soft-deleted).
    #[error("Expense not found: {0}")]
    NotFound(ExpenseId),

    /// The expense is already deleted.
    #[error("Expense {0} is already deleted")]
    AlreadyDeleted(ExpenseId),

    /// Only the payer or a team administrator may edit the note.
    #[error("User {0} may not edit this expense")]
    NotPayerOrAdmin(UserId),

    /// Split validation failed.
    #[error(transparent)]
    Split(#[from] SplitError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ExpenseError> for splitledger_shared::AppError {
    fn from(err: ExpenseError) -> Self {
        match err {
            ExpenseError::NotTeamMember(_) | ExpenseError::NotPayerOrAdmin(_) => {
                Self::Forbidden(err.to_string())
            }
            ExpenseError::NotFound(_) => Self::NotFound(err.to_string()),
            ExpenseError::AlreadyDeleted(_) => Self::Conflict(err.to_string()),
            ExpenseError::Split(_) => Self::InvalidInput(err.to_string()),
            ExpenseError::Database(_) => Self::Database(err.to_string()),
        }
    }
}

/// An expense with its live settlement rows.
#[derive(Debug, Clone)]
pub struct ExpenseWithSettlements {
    /// The expense.
    pub expense: expenses::Model,
    /// Its live settlements.
    pub settlements: Vec<settlements::Model>,
}

/// The result of creating an installment plan.
#[derive(Debug, Clone)]
pub struct CreatedInstallmentPlan {
    /// The parent expense (not itself settled).
    pub parent: expenses::Model,
    /// The child expenses with their settlements, in installment order.
    pub children: Vec<ExpenseWithSettlements>,
}

/// Expense repository.
#[derive(Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
    notifier: Arc<dyn Notifier>,
}

impl ExpenseRepository {
    /// Creates a new expense repository with the logging notifier.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_notifier(db, Arc::new(LogNotifier))
    }

    /// Creates a new expense repository with a custom notification collaborator.
    #[must_use]
    pub fn with_notifier(db: DatabaseConnection, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    /// Creates an expense and one pending settlement per non-payer member,
    /// in one transaction.
    ///
    /// The split is computed over the *current* member list; the payer
    /// absorbs their own share. Non-payer members are notified after the
    /// commit, best effort.
    ///
    /// # Errors
    ///
    /// Returns an error if the payer is not a team member, the amount fails
    /// validation, or the database fails.
    pub async fn create_expense(
        &self,
        team: TeamId,
        payer: UserId,
        amount: Decimal,
        category: &str,
        note: Option<String>,
    ) -> Result<ExpenseWithSettlements, ExpenseError> {
        let roster = scope::team_members(&self.db, team).await?;
        if !roster.iter().any(|m| m.user_id == payer.into_inner()) {
            return Err(ExpenseError::NotTeamMember(payer));
        }

        let share = split::even_share(amount, roster.len())?;
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let expense = expenses::ActiveModel {
            id: Set(Uuid::now_v7()),
            team_id: Set(team.into_inner()),
            payer: Set(payer.into_inner()),
            amount: Set(amount),
            category: Set(category.to_string()),
            note: Set(note),
            is_installment: Set(false),
            total_installments: Set(None),
            installment_index: Set(None),
            parent_expense_id: Set(None),
            due_day_of_month: Set(None),
            due_date: Set(None),
            created_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let mut rows = Vec::with_capacity(roster.len().saturating_sub(1));
        for member in &roster {
            if member.user_id == payer.into_inner() {
                continue;
            }
            rows.push(
                insert_settlement(&txn, expense.id, member.user_id, share, now.into()).await?,
            );
        }

        ActivityRepository::append(
            &txn,
            team,
            payer,
            "expense.created",
            format!(
                "{category}: {amount} split across {} members",
                roster.len()
            ),
        )
        .await?;

        txn.commit().await?;

        for row in &rows {
            notify::dispatch(
                &self.notifier,
                UserId::from_uuid(row.owed_by),
                NotificationPayload {
                    team,
                    kind: NotificationKind::ShareAssigned,
                    amount: Some(row.amount_owed),
                    detail: category.to_string(),
                },
            );
        }

        Ok(ExpenseWithSettlements {
            expense,
            settlements: rows,
        })
    }

    /// Creates an installment plan: one parent expense and `months` child
    /// expenses with their settlements, in one transaction.
    ///
    /// Child amounts and per-participant shares round up per the split
    /// calculator; each child's due date is `due_day` in its target month,
    /// clamped to that month's last day.
    ///
    /// # Errors
    ///
    /// Returns an error if the payer is not a team member, any input fails
    /// validation, or the database fails.
    #[allow(clippy::too_many_lines)]
    pub async fn create_installment_plan(
        &self,
        team: TeamId,
        payer: UserId,
        total_amount: Decimal,
        months: u32,
        category: &str,
        due_day: u32,
        note: Option<String>,
    ) -> Result<CreatedInstallmentPlan, ExpenseError> {
        let roster = scope::team_members(&self.db, team).await?;
        if !roster.iter().any(|m| m.user_id == payer.into_inner()) {
            return Err(ExpenseError::NotTeamMember(payer));
        }

        let plan = split::installment_plan(total_amount, months, roster.len())?;
        let now = Utc::now();
        let dates = split::due_dates(now.date_naive(), months, due_day)?;

        let txn = self.db.begin().await?;

        let parent = expenses::ActiveModel {
            id: Set(Uuid::now_v7()),
            team_id: Set(team.into_inner()),
            payer: Set(payer.into_inner()),
            amount: Set(total_amount),
            category: Set(category.to_string()),
            note: Set(note.clone()),
            is_installment: Set(true),
            total_installments: Set(Some(months.cast_signed())),
            installment_index: Set(None),
            parent_expense_id: Set(None),
            due_day_of_month: Set(Some(due_day.cast_signed())),
            due_date: Set(None),
            created_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let mut children = Vec::with_capacity(dates.len());
        for (index, due_date) in (1i32..).zip(dates) {
            let child = expenses::ActiveModel {
                id: Set(Uuid::now_v7()),
                team_id: Set(team.into_inner()),
                payer: Set(payer.into_inner()),
                amount: Set(plan.monthly_amount),
                category: Set(category.to_string()),
                note: Set(None),
                is_installment: Set(true),
                total_installments: Set(None),
                installment_index: Set(Some(index)),
                parent_expense_id: Set(Some(parent.id)),
                due_day_of_month: Set(None),
                due_date: Set(Some(due_date)),
                created_at: Set(now.into()),
                deleted_at: Set(None),
            }
            .insert(&txn)
            .await?;

            let mut rows = Vec::with_capacity(roster.len().saturating_sub(1));
            for member in &roster {
                if member.user_id == payer.into_inner() {
                    continue;
                }
                rows.push(
                    insert_settlement(
                        &txn,
                        child.id,
                        member.user_id,
                        plan.per_participant,
                        now.into(),
                    )
                    .await?,
                );
            }

            children.push(ExpenseWithSettlements {
                expense: child,
                settlements: rows,
            });
        }

        ActivityRepository::append(
            &txn,
            team,
            payer,
            "expense.plan_created",
            format!(
                "{category}: {total_amount} over {months} months, {} per member per month",
                plan.per_participant
            ),
        )
        .await?;

        txn.commit().await?;

        for member in &roster {
            if member.user_id == payer.into_inner() {
                continue;
            }
            notify::dispatch(
                &self.notifier,
                UserId::from_uuid(member.user_id),
                NotificationPayload {
                    team,
                    kind: NotificationKind::ShareAssigned,
                    amount: Some(plan.per_participant),
                    detail: format!("{category} ({months} monthly installments)"),
                },
            );
        }

        Ok(CreatedInstallmentPlan { parent, children })
    }

    /// Updates an expense's note.
    ///
    /// Only the payer or a team administrator may edit, and only the note:
    /// amount edits are disallowed so already-computed (possibly paid)
    /// settlements are never invalidated.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense is missing, the actor lacks
    /// authority, or the database fails.
    pub async fn update_note(
        &self,
        expense_id: ExpenseId,
        actor: UserId,
        note: Option<String>,
    ) -> Result<expenses::Model, ExpenseError> {
        let expense = scope::find_active_expense(&self.db, expense_id)
            .await?
            .ok_or(ExpenseError::NotFound(expense_id))?;

        let team = TeamId::from_uuid(expense.team_id);
        if expense.payer != actor.into_inner() && !is_admin(&self.db, team, actor).await? {
            return Err(ExpenseError::NotPayerOrAdmin(actor));
        }

        let txn = self.db.begin().await?;

        let mut active: expenses::ActiveModel = expense.into();
        active.note = Set(note);
        let updated = active.update(&txn).await?;

        ActivityRepository::append(
            &txn,
            team,
            actor,
            "expense.updated",
            format!("note edited on {}", updated.category),
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Soft-deletes an expense and all its live settlements in one
    /// transaction. Deleting an installment parent tombstones its live
    /// children and their settlements too.
    ///
    /// # Errors
    ///
    /// Returns an error if the expense is missing or already deleted, the
    /// actor is not a team member, or the database fails.
    pub async fn soft_delete(
        &self,
        expense_id: ExpenseId,
        actor: UserId,
    ) -> Result<(), ExpenseError> {
        let expense = expenses::Entity::find_by_id(expense_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(ExpenseError::NotFound(expense_id))?;
        if expense.deleted_at.is_some() {
            return Err(ExpenseError::AlreadyDeleted(expense_id));
        }

        let team = TeamId::from_uuid(expense.team_id);
        if scope::find_member(&self.db, team, actor).await?.is_none() {
            return Err(ExpenseError::NotTeamMember(actor));
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let mut targets = vec![expense.id];
        if expense.is_installment && expense.parent_expense_id.is_none() {
            let children = scope::live_children(&txn, expense_id).await?;
            targets.extend(children.iter().map(|c| c.id));
        }

        for target in &targets {
            tombstone_expense(&txn, *target, now.into()).await?;
        }

        ActivityRepository::append(
            &txn,
            team,
            actor,
            "expense.deleted",
            format!("{} removed", expense.category),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }

    /// Gets a live expense with its live settlements.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing or soft-deleted expense.
    pub async fn get(&self, expense_id: ExpenseId) -> Result<ExpenseWithSettlements, ExpenseError> {
        let expense = scope::find_active_expense(&self.db, expense_id)
            .await?
            .ok_or(ExpenseError::NotFound(expense_id))?;
        let settlements = scope::expense_settlements(&self.db, expense_id).await?;
        Ok(ExpenseWithSettlements {
            expense,
            settlements,
        })
    }

    /// Lists a team's live expenses, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_team(&self, team: TeamId) -> Result<Vec<expenses::Model>, ExpenseError> {
        Ok(scope::team_expenses(&self.db, team).await?)
    }
}

/// Inserts one pending settlement row.
async fn insert_settlement(
    txn: &DatabaseTransaction,
    expense_id: Uuid,
    owed_by: Uuid,
    amount: Decimal,
    now: sea_orm::prelude::DateTimeWithTimeZone,
) -> Result<settlements::Model, DbErr> {
    settlements::ActiveModel {
        id: Set(Uuid::now_v7()),
        expense_id: Set(expense_id),
        owed_by: Set(owed_by),
        amount_owed: Set(amount),
        status: Set(settlements::Status::Pending),
        payment_method: Set(None),
        proof_reference: Set(None),
        paid_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(txn)
    .await
}

/// Tombstones one expense and its live settlements.
async fn tombstone_expense(
    txn: &DatabaseTransaction,
    expense_id: Uuid,
    now: sea_orm::prelude::DateTimeWithTimeZone,
) -> Result<(), DbErr> {
    expenses::Entity::update_many()
        .col_expr(expenses::Column::DeletedAt, Expr::value(now))
        .filter(expenses::Column::Id.eq(expense_id))
        .exec(txn)
        .await?;

    settlements::Entity::update_many()
        .col_expr(settlements::Column::DeletedAt, Expr::value(now))
        .col_expr(settlements::Column::UpdatedAt, Expr::value(now))
        .filter(settlements::Column::ExpenseId.eq(expense_id))
        .filter(settlements::Column::DeletedAt.is_null())
        .exec(txn)
        .await?;

    Ok(())
}

/// Whether the user holds the ADMIN role on the team.
async fn is_admin(
    db: &DatabaseConnection,
    team: TeamId,
    user: UserId,
) -> Result<bool, DbErr> {
    Ok(scope::find_member(db, team, user)
        .await?
        .is_some_and(|m| m.role == members::Role::Admin))
}
