//! Activity repository: the append-only audit trail.
//!
//! `append` takes the caller's connection handle so audit records are
//! written inside the same transaction as the mutation they describe.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use splitledger_shared::types::{TeamId, UserId};
use uuid::Uuid;

use crate::entities::activities;

/// Activity repository for audit reads and in-transaction appends.
#[derive(Debug, Clone)]
pub struct ActivityRepository {
    db: DatabaseConnection,
}

impl ActivityRepository {
    /// Creates a new activity repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends one audit record on the given connection or transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn append<C: ConnectionTrait>(
        conn: &C,
        team: TeamId,
        actor: UserId,
        action: &str,
        detail: String,
    ) -> Result<activities::Model, DbErr> {
        let record = activities::ActiveModel {
            id: Set(Uuid::now_v7()),
            team_id: Set(team.into_inner()),
            actor: Set(actor.into_inner()),
            action: Set(action.to_string()),
            detail: Set(detail),
            created_at: Set(Utc::now().into()),
        };
        record.insert(conn).await
    }

    /// Lists a team's audit trail, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_team(&self, team: TeamId) -> Result<Vec<activities::Model>, DbErr> {
        activities::Entity::find()
            .filter(activities::Column::TeamId.eq(team.into_inner()))
            .order_by_desc(activities::Column::CreatedAt)
            .all(&self.db)
            .await
    }
}
