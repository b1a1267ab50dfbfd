//! Member repository: roster changes and the recalculation they trigger.
//!
//! A join or admin-add and its settlement recalculation commit together:
//! the snapshot is read on the transaction, the core planner derives the
//! mutation batch, and the batch is applied before the commit. A crash
//! mid-way leaves nothing applied.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    ModelTrait, QueryFilter, Set, TransactionTrait,
};
use splitledger_core::membership::{
    self, AdditionTrigger, MemberSnapshot, MembershipError, RecalcCounts, RecalcPlan, TeamRole,
};
use splitledger_shared::types::{TeamId, UserId};
use uuid::Uuid;

use super::activity::ActivityRepository;
use super::scope;
use crate::entities::{members, settlements};

/// Error types for member operations.
#[derive(Debug, thiserror::Error)]
pub enum MemberError {
    /// The user is already on the team.
    #[error("User {0} is already a member of the team")]
    AlreadyMember(UserId),

    /// The acting user is not a member of the team.
    #[error("User {0} is not a member of the team")]
    NotTeamMember(UserId),

    /// The operation requires the ADMIN role.
    #[error("User {0} is not a team administrator")]
    NotAdmin(UserId),

    /// A membership invariant or the recalculation planner rejected the change.
    #[error(transparent)]
    Membership(#[from] MembershipError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<MemberError> for splitledger_shared::AppError {
    fn from(err: MemberError) -> Self {
        match &err {
            MemberError::AlreadyMember(_) => Self::Conflict(err.to_string()),
            MemberError::NotTeamMember(_) | MemberError::NotAdmin(_) => {
                Self::Forbidden(err.to_string())
            }
            MemberError::Membership(inner) => match inner {
                MembershipError::UnknownMember(_) => Self::NotFound(err.to_string()),
                MembershipError::LastAdmin(_) => Self::Conflict(err.to_string()),
                _ => Self::InvalidInput(err.to_string()),
            },
            MemberError::Database(_) => Self::Database(err.to_string()),
        }
    }
}

/// Member repository.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    db: DatabaseConnection,
}

impl MemberRepository {
    /// Creates a new member repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adds a user who accepted an invite, recalculating outstanding
    /// settlements in the same transaction.
    ///
    /// The first member of a team becomes its administrator; later joiners
    /// arrive as regular members. Invite-code validation is the caller's
    /// concern.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is already on the roster, the planner
    /// rejects the recalculation, or the database fails.
    pub async fn join_team(
        &self,
        team: TeamId,
        user: UserId,
    ) -> Result<members::Model, MemberError> {
        self.admit(team, user, None, AdditionTrigger::Join, user).await
    }

    /// Adds a user on an administrator's behalf, recalculating outstanding
    /// settlements in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an administrator, the user is
    /// already on the roster, or the database fails.
    pub async fn add_member(
        &self,
        team: TeamId,
        actor: UserId,
        user: UserId,
        role: TeamRole,
    ) -> Result<members::Model, MemberError> {
        self.require_admin(team, actor).await?;
        self.admit(team, user, Some(role), AdditionTrigger::AdminAdd, actor)
            .await
    }

    /// Removes a member (self-leave, or removal by an administrator).
    ///
    /// The team must keep at least one administrator while any member
    /// remains. No recalculation runs here; the maintenance pass converges
    /// the ledger afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor lacks authority, the removal would
    /// strand the team without an administrator, or the database fails.
    pub async fn remove_member(
        &self,
        team: TeamId,
        actor: UserId,
        user: UserId,
    ) -> Result<(), MemberError> {
        if actor != user {
            self.require_admin(team, actor).await?;
        }

        let txn = self.db.begin().await?;

        let roster = scope::team_members(&txn, team).await?;
        let snapshot: Vec<MemberSnapshot> = roster
            .iter()
            .map(|m| MemberSnapshot {
                user: UserId::from_uuid(m.user_id),
                role: m.role.clone().into(),
            })
            .collect();
        membership::check_removal(&snapshot, user)?;

        let leaving = roster
            .into_iter()
            .find(|m| m.user_id == user.into_inner())
            .ok_or(MembershipError::UnknownMember(user))?;
        leaving.delete(&txn).await?;

        let action = if actor == user {
            "member.left"
        } else {
            "member.removed"
        };
        ActivityRepository::append(&txn, team, actor, action, format!("user {user}")).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Administrator-invoked maintenance recalculation.
    ///
    /// Re-derives every pending settlement against the current active
    /// member set, removes pending rows owed by departed users, fills in
    /// missing rows, and reports the applied counts. A convergence pass for
    /// drift after unrecorded membership changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an administrator, the roster is
    /// empty, or the database fails.
    pub async fn maintenance_recalc(
        &self,
        team: TeamId,
        actor: UserId,
    ) -> Result<RecalcCounts, MemberError> {
        self.require_admin(team, actor).await?;

        let txn = self.db.begin().await?;

        let roster = scope::team_members(&txn, team).await?;
        let active = roster
            .iter()
            .map(|m| UserId::from_uuid(m.user_id))
            .collect();
        let snapshots = scope::team_expense_snapshots(&txn, team).await?;
        let plan = membership::plan_maintenance(&snapshots, &active)?;
        let counts = plan.counts();

        apply_plan(&txn, &plan).await?;

        ActivityRepository::append(
            &txn,
            team,
            actor,
            "team.recalculated",
            format!(
                "{} expenses: {} updated, {} created, {} removed",
                counts.expenses, counts.updated, counts.created, counts.removed
            ),
        )
        .await?;

        txn.commit().await?;
        Ok(counts)
    }

    /// Lists the team roster ordered by join time.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_active(&self, team: TeamId) -> Result<Vec<members::Model>, MemberError> {
        Ok(scope::team_members(&self.db, team).await?)
    }

    /// Shared admission path for joins and admin-adds.
    async fn admit(
        &self,
        team: TeamId,
        user: UserId,
        role: Option<TeamRole>,
        trigger: AdditionTrigger,
        actor: UserId,
    ) -> Result<members::Model, MemberError> {
        let txn = self.db.begin().await?;

        if scope::find_member(&txn, team, user).await?.is_some() {
            return Err(MemberError::AlreadyMember(user));
        }

        let roster = scope::team_members(&txn, team).await?;
        let role = role.unwrap_or(if roster.is_empty() {
            TeamRole::Admin
        } else {
            TeamRole::Member
        });
        let new_count = roster.len() + 1;

        let snapshots = scope::team_expense_snapshots(&txn, team).await?;
        let plan = membership::plan_member_addition(&snapshots, user, new_count, trigger)?;
        let counts = plan.counts();

        let member = members::ActiveModel {
            id: Set(Uuid::now_v7()),
            team_id: Set(team.into_inner()),
            user_id: Set(user.into_inner()),
            role: Set(role.into()),
            joined_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        apply_plan(&txn, &plan).await?;

        let action = match trigger {
            AdditionTrigger::Join => "member.joined",
            AdditionTrigger::AdminAdd => "member.added",
        };
        ActivityRepository::append(
            &txn,
            team,
            actor,
            action,
            format!("user {user}, {} expenses recalculated", counts.expenses),
        )
        .await?;

        txn.commit().await?;
        Ok(member)
    }

    /// Requires the actor to hold the ADMIN role on the team.
    async fn require_admin(&self, team: TeamId, actor: UserId) -> Result<(), MemberError> {
        let member = scope::find_member(&self.db, team, actor)
            .await?
            .ok_or(MemberError::NotTeamMember(actor))?;
        if member.role != members::Role::Admin {
            return Err(MemberError::NotAdmin(actor));
        }
        Ok(())
    }
}

/// Applies a validated recalculation plan on the transaction.
async fn apply_plan(txn: &DatabaseTransaction, plan: &RecalcPlan) -> Result<(), DbErr> {
    let now = Utc::now();

    for (id, amount) in &plan.updates {
        settlements::Entity::update_many()
            .col_expr(settlements::Column::AmountOwed, Expr::value(*amount))
            .col_expr(
                settlements::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(now)),
            )
            .filter(settlements::Column::Id.eq(id.into_inner()))
            .filter(settlements::Column::Status.eq(settlements::Status::Pending))
            .filter(settlements::Column::DeletedAt.is_null())
            .exec(txn)
            .await?;
    }

    for insert in &plan.inserts {
        settlements::ActiveModel {
            id: Set(Uuid::now_v7()),
            expense_id: Set(insert.expense.into_inner()),
            owed_by: Set(insert.owed_by.into_inner()),
            amount_owed: Set(insert.amount),
            status: Set(settlements::Status::Pending),
            payment_method: Set(None),
            proof_reference: Set(None),
            paid_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(txn)
        .await?;
    }

    for id in &plan.deletes {
        settlements::Entity::update_many()
            .col_expr(
                settlements::Column::DeletedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(now)),
            )
            .col_expr(
                settlements::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(now)),
            )
            .filter(settlements::Column::Id.eq(id.into_inner()))
            .filter(settlements::Column::Status.eq(settlements::Status::Pending))
            .filter(settlements::Column::DeletedAt.is_null())
            .exec(txn)
            .await?;
    }

    Ok(())
}
