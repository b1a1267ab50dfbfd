//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the ledger store
//! - Portable schema migrations
//! - Repository abstractions executing the core's plans in single transactions
//! - The append-only audit trail and the notification boundary

pub mod entities;
pub mod migration;
pub mod notify;
pub mod repositories;

pub use notify::{LogNotifier, NotificationKind, NotificationPayload, Notifier};
pub use repositories::{
    ActivityRepository, AgreementRepository, BalanceRepository, ExpenseRepository,
    MemberRepository, SettlementRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
