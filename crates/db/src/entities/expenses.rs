//! `SeaORM` Entity for the expenses table.
//!
//! An installment plan is one parent row (amount = total plan amount, never
//! settled directly) owning N child rows, each independently settled with
//! its own due date. Expenses are tombstoned, not removed, so historical
//! settlements remain resolvable.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A spend event.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Expense id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// The team the expense belongs to.
    pub team_id: Uuid,
    /// The member who paid.
    pub payer: Uuid,
    /// Expense amount (total plan amount for an installment parent).
    pub amount: Decimal,
    /// Spend category.
    pub category: String,
    /// Optional free-text note.
    pub note: Option<String>,
    /// Whether this row is part of an installment plan.
    pub is_installment: bool,
    /// Number of installments (parent rows only).
    pub total_installments: Option<i32>,
    /// 1-based index within the plan (child rows only).
    pub installment_index: Option<i32>,
    /// Owning parent (child rows only).
    pub parent_expense_id: Option<Uuid>,
    /// Requested day of month for due dates (parent rows only).
    pub due_day_of_month: Option<i32>,
    /// Due date (child rows only).
    pub due_date: Option<Date>,
    /// Creation time.
    pub created_at: DateTimeWithTimeZone,
    /// Tombstone marker.
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

/// Entity relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Settlements owed on this expense.
    #[sea_orm(has_many = "super::settlements::Entity")]
    Settlements,
}

impl Related<super::settlements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Settlements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
