//! Initial schema migration - creates all ledger tables from scratch.
//!
//! The schema is built with the portable schema builder so the same
//! migrations run against Postgres in production and in-memory SQLite in
//! the integration suite:
//!
//! - `members`: a user's participation in a team
//! - `expenses`: spend events, including installment parents and children
//! - `settlements`: per-member obligations on an expense
//! - `settlement_agreements`: mutual-debt netting proposals
//! - `activities`: the append-only audit trail

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Members {
    Table,
    Id,
    TeamId,
    UserId,
    Role,
    JoinedAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    TeamId,
    Payer,
    Amount,
    Category,
    Note,
    IsInstallment,
    TotalInstallments,
    InstallmentIndex,
    ParentExpenseId,
    DueDayOfMonth,
    DueDate,
    CreatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum Settlements {
    Table,
    Id,
    ExpenseId,
    OwedBy,
    AmountOwed,
    Status,
    PaymentMethod,
    ProofReference,
    PaidAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum SettlementAgreements {
    Table,
    Id,
    TeamId,
    Proposer,
    Responder,
    ProposerOwes,
    ResponderOwes,
    Status,
    SettlementIds,
    ProposedAt,
    RespondedAt,
}

#[derive(Iden)]
enum Activities {
    Table,
    Id,
    TeamId,
    Actor,
    Action,
    Detail,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Members::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Members::TeamId).uuid().not_null())
                    .col(ColumnDef::new(Members::UserId).uuid().not_null())
                    .col(ColumnDef::new(Members::Role).string().not_null())
                    .col(
                        ColumnDef::new(Members::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-members-team_id-user_id-unique")
                    .table(Members::Table)
                    .col(Members::TeamId)
                    .col(Members::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::TeamId).uuid().not_null())
                    .col(ColumnDef::new(Expenses::Payer).uuid().not_null())
                    .col(
                        ColumnDef::new(Expenses::Amount)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::Category).string().not_null())
                    .col(ColumnDef::new(Expenses::Note).string())
                    .col(
                        ColumnDef::new(Expenses::IsInstallment)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Expenses::TotalInstallments).integer())
                    .col(ColumnDef::new(Expenses::InstallmentIndex).integer())
                    .col(ColumnDef::new(Expenses::ParentExpenseId).uuid())
                    .col(ColumnDef::new(Expenses::DueDayOfMonth).integer())
                    .col(ColumnDef::new(Expenses::DueDate).date())
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenses::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenses-parent_expense_id")
                            .from(Expenses::Table, Expenses::ParentExpenseId)
                            .to(Expenses::Table, Expenses::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-team_id-created_at")
                    .table(Expenses::Table)
                    .col(Expenses::TeamId)
                    .col(Expenses::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-parent_expense_id")
                    .table(Expenses::Table)
                    .col(Expenses::ParentExpenseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Settlements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settlements::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Settlements::ExpenseId).uuid().not_null())
                    .col(ColumnDef::new(Settlements::OwedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Settlements::AmountOwed)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Settlements::Status).string().not_null())
                    .col(ColumnDef::new(Settlements::PaymentMethod).string())
                    .col(ColumnDef::new(Settlements::ProofReference).string())
                    .col(ColumnDef::new(Settlements::PaidAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Settlements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Settlements::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Settlements::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlements-expense_id")
                            .from(Settlements::Table, Settlements::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Non-unique: a tombstoned row may share its pair with a live one.
        // Uniqueness among live rows is enforced at the storage boundary.
        manager
            .create_index(
                Index::create()
                    .name("idx-settlements-expense_id-owed_by")
                    .table(Settlements::Table)
                    .col(Settlements::ExpenseId)
                    .col(Settlements::OwedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-settlements-owed_by-status")
                    .table(Settlements::Table)
                    .col(Settlements::OwedBy)
                    .col(Settlements::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SettlementAgreements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SettlementAgreements::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SettlementAgreements::TeamId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementAgreements::Proposer)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementAgreements::Responder)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementAgreements::ProposerOwes)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementAgreements::ResponderOwes)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementAgreements::Status)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementAgreements::SettlementIds)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementAgreements::ProposedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SettlementAgreements::RespondedAt)
                            .timestamp_with_time_zone(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-settlement_agreements-team_id-status")
                    .table(SettlementAgreements::Table)
                    .col(SettlementAgreements::TeamId)
                    .col(SettlementAgreements::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Activities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Activities::TeamId).uuid().not_null())
                    .col(ColumnDef::new(Activities::Actor).uuid().not_null())
                    .col(ColumnDef::new(Activities::Action).string().not_null())
                    .col(ColumnDef::new(Activities::Detail).string().not_null())
                    .col(
                        ColumnDef::new(Activities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-activities-team_id-created_at")
                    .table(Activities::Table)
                    .col(Activities::TeamId)
                    .col(Activities::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Activities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SettlementAgreements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Settlements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        Ok(())
    }
}
