//! Balance repository: read-only net balance aggregation.
//!
//! Fetches live settlement rows and folds them with the core aggregator.
//! Nothing is cached; every call reflects the most recent committed
//! transaction.

use sea_orm::{DatabaseConnection, DbErr};
use splitledger_core::balance::{BalanceSummary, summarize};
use splitledger_shared::types::{TeamId, UserId};

use super::scope;

/// Error types for balance reads.
#[derive(Debug, thiserror::Error)]
pub enum BalanceError {
    /// The user is not a member of the team.
    #[error("User {0} is not a member of the team")]
    NotTeamMember(UserId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<BalanceError> for splitledger_shared::AppError {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::NotTeamMember(_) => Self::Forbidden(err.to_string()),
            BalanceError::Database(_) => Self::Database(err.to_string()),
        }
    }
}

/// Balance repository.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Computes what the user owes and is owed within the team, from live
    /// settlement state.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is not a team member or the query fails.
    pub async fn team_balance(
        &self,
        team: TeamId,
        user: UserId,
    ) -> Result<BalanceSummary, BalanceError> {
        if scope::find_member(&self.db, team, user).await?.is_none() {
            return Err(BalanceError::NotTeamMember(user));
        }

        let rows = scope::team_settlement_rows(&self.db, team).await?;
        Ok(summarize(user, &rows))
    }
}
