//! `SeaORM` Entity for the settlements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use splitledger_core::settlement::SettlementStatus;

/// Status column values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Status {
    /// Obligation recorded, no payment attempted.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Payment submitted, awaiting the creditor's verification.
    #[sea_orm(string_value = "unconfirmed")]
    Unconfirmed,
    /// Payment confirmed or netted.
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl From<SettlementStatus> for Status {
    fn from(status: SettlementStatus) -> Self {
        match status {
            SettlementStatus::Pending => Self::Pending,
            SettlementStatus::Unconfirmed => Self::Unconfirmed,
            SettlementStatus::Paid => Self::Paid,
        }
    }
}

impl From<Status> for SettlementStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Pending => Self::Pending,
            Status::Unconfirmed => Self::Unconfirmed,
            Status::Paid => Self::Paid,
        }
    }
}

/// One member's recorded obligation to the payer of one expense.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "settlements")]
pub struct Model {
    /// Settlement id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// The expense the obligation belongs to.
    pub expense_id: Uuid,
    /// The member owing.
    pub owed_by: Uuid,
    /// Amount owed.
    pub amount_owed: Decimal,
    /// Lifecycle status.
    pub status: Status,
    /// Payment-method tag (set on submission, mark-as-paid, or netting).
    pub payment_method: Option<String>,
    /// Opaque reference to payment proof held by an external store.
    pub proof_reference: Option<String>,
    /// Set only when a payment is confirmed.
    pub paid_at: Option<DateTimeWithTimeZone>,
    /// Creation time.
    pub created_at: DateTimeWithTimeZone,
    /// Last mutation time.
    pub updated_at: DateTimeWithTimeZone,
    /// Tombstone marker.
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

/// Entity relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The owning expense.
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id"
    )]
    Expense,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
