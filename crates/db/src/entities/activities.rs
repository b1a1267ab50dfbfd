//! `SeaORM` Entity for the activities table (append-only audit trail).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One audit record, written inside the transaction it describes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    /// Activity id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// The team the action happened in.
    pub team_id: Uuid,
    /// The acting user.
    pub actor: Uuid,
    /// Stable action tag, e.g. `expense.created`.
    pub action: String,
    /// Free-text detail.
    pub detail: String,
    /// When the action happened.
    pub created_at: DateTimeWithTimeZone,
}

/// Entity relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
