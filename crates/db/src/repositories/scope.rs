//! Active-row scoping helpers.
//!
//! Tombstone filtering is enforced here, at the storage-access boundary:
//! every repository query for live data goes through these helpers, so a
//! call site cannot accidentally include a soft-deleted row by forgetting a
//! filter.

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use splitledger_core::membership::{ExpenseSnapshot, SettlementSnapshot};
use splitledger_core::settlement::SettlementRow;
use splitledger_shared::types::{ExpenseId, SettlementId, TeamId, UserId};
use uuid::Uuid;

use crate::entities::{expenses, members, settlements};

/// Loads one member row, if the user is on the team.
pub(crate) async fn find_member<C: ConnectionTrait>(
    conn: &C,
    team: TeamId,
    user: UserId,
) -> Result<Option<members::Model>, DbErr> {
    members::Entity::find()
        .filter(members::Column::TeamId.eq(team.into_inner()))
        .filter(members::Column::UserId.eq(user.into_inner()))
        .one(conn)
        .await
}

/// Loads the team roster ordered by join time.
pub(crate) async fn team_members<C: ConnectionTrait>(
    conn: &C,
    team: TeamId,
) -> Result<Vec<members::Model>, DbErr> {
    members::Entity::find()
        .filter(members::Column::TeamId.eq(team.into_inner()))
        .order_by_asc(members::Column::JoinedAt)
        .all(conn)
        .await
}

/// Loads one live expense.
pub(crate) async fn find_active_expense<C: ConnectionTrait>(
    conn: &C,
    id: ExpenseId,
) -> Result<Option<expenses::Model>, DbErr> {
    expenses::Entity::find_by_id(id.into_inner())
        .filter(expenses::Column::DeletedAt.is_null())
        .one(conn)
        .await
}

/// Loads every live expense of a team, newest first.
pub(crate) async fn team_expenses<C: ConnectionTrait>(
    conn: &C,
    team: TeamId,
) -> Result<Vec<expenses::Model>, DbErr> {
    expenses::Entity::find()
        .filter(expenses::Column::TeamId.eq(team.into_inner()))
        .filter(expenses::Column::DeletedAt.is_null())
        .order_by_desc(expenses::Column::CreatedAt)
        .all(conn)
        .await
}

/// Loads the live children of an installment parent.
pub(crate) async fn live_children<C: ConnectionTrait>(
    conn: &C,
    parent: ExpenseId,
) -> Result<Vec<expenses::Model>, DbErr> {
    expenses::Entity::find()
        .filter(expenses::Column::ParentExpenseId.eq(parent.into_inner()))
        .filter(expenses::Column::DeletedAt.is_null())
        .order_by_asc(expenses::Column::InstallmentIndex)
        .all(conn)
        .await
}

/// Loads one live settlement.
pub(crate) async fn find_active_settlement<C: ConnectionTrait>(
    conn: &C,
    id: SettlementId,
) -> Result<Option<settlements::Model>, DbErr> {
    settlements::Entity::find_by_id(id.into_inner())
        .filter(settlements::Column::DeletedAt.is_null())
        .one(conn)
        .await
}

/// Loads the live settlements of one expense.
pub(crate) async fn expense_settlements<C: ConnectionTrait>(
    conn: &C,
    expense: ExpenseId,
) -> Result<Vec<settlements::Model>, DbErr> {
    settlements::Entity::find()
        .filter(settlements::Column::ExpenseId.eq(expense.into_inner()))
        .filter(settlements::Column::DeletedAt.is_null())
        .all(conn)
        .await
}

/// Loads a set of live settlements by id.
pub(crate) async fn settlements_by_ids<C: ConnectionTrait>(
    conn: &C,
    ids: &[SettlementId],
) -> Result<Vec<settlements::Model>, DbErr> {
    let raw: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
    settlements::Entity::find()
        .filter(settlements::Column::Id.is_in(raw))
        .filter(settlements::Column::DeletedAt.is_null())
        .all(conn)
        .await
}

/// Loads every live (expense, settlements) snapshot of a team for the
/// recalculation planner.
pub(crate) async fn team_expense_snapshots<C: ConnectionTrait>(
    conn: &C,
    team: TeamId,
) -> Result<Vec<ExpenseSnapshot>, DbErr> {
    let expense_rows = team_expenses(conn, team).await?;
    let mut snapshots = Vec::with_capacity(expense_rows.len());

    for expense in expense_rows {
        // Installment parents are never settled directly.
        if expense.is_installment && expense.parent_expense_id.is_none() {
            continue;
        }
        let rows = expense_settlements(conn, ExpenseId::from_uuid(expense.id)).await?;
        snapshots.push(ExpenseSnapshot {
            id: ExpenseId::from_uuid(expense.id),
            payer: UserId::from_uuid(expense.payer),
            amount: expense.amount,
            settlements: rows
                .into_iter()
                .map(|row| SettlementSnapshot {
                    id: SettlementId::from_uuid(row.id),
                    owed_by: UserId::from_uuid(row.owed_by),
                    status: row.status.into(),
                    amount: row.amount_owed,
                })
                .collect(),
        });
    }

    Ok(snapshots)
}

/// Loads every live settlement of a team as read-model rows with both
/// parties resolved, for the balance aggregator and the negotiator.
pub(crate) async fn team_settlement_rows<C: ConnectionTrait>(
    conn: &C,
    team: TeamId,
) -> Result<Vec<SettlementRow>, DbErr> {
    let expense_rows = team_expenses(conn, team).await?;
    let mut rows = Vec::new();

    for expense in expense_rows {
        let settlements = expense_settlements(conn, ExpenseId::from_uuid(expense.id)).await?;
        rows.extend(settlements.into_iter().map(|row| SettlementRow {
            settlement: SettlementId::from_uuid(row.id),
            expense: ExpenseId::from_uuid(expense.id),
            creditor: UserId::from_uuid(expense.payer),
            debtor: UserId::from_uuid(row.owed_by),
            status: row.status.into(),
            amount: row.amount_owed,
        }));
    }

    Ok(rows)
}
