//! Shared harness for the integration suite.
//!
//! Each test runs the real migrations against a fresh in-memory SQLite
//! database, then drives the repositories exactly as the application layer
//! would.

use sea_orm::{Database, DatabaseConnection};
use splitledger_db::MemberRepository;
use splitledger_db::migration::{Migrator, MigratorTrait};
use splitledger_shared::types::{TeamId, UserId};

/// Connects to a fresh in-memory database with the schema applied.
pub async fn connect() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    Migrator::up(&db, None).await.expect("migrations");
    db
}

/// Creates a team with `n` members. The first joiner becomes the ADMIN.
pub async fn team_with_members(db: &DatabaseConnection, n: usize) -> (TeamId, Vec<UserId>) {
    let team = TeamId::new();
    let repo = MemberRepository::new(db.clone());

    let mut users = Vec::with_capacity(n);
    for _ in 0..n {
        let user = UserId::new();
        repo.join_team(team, user).await.expect("join");
        users.push(user);
    }

    (team, users)
}
