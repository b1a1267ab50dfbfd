//! `SeaORM` Entity for the settlement_agreements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use splitledger_core::netting::AgreementStatus;

/// Status column values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Status {
    /// Awaiting the responder's decision.
    #[sea_orm(string_value = "proposed")]
    Proposed,
    /// Accepted; pinned settlements cancelled.
    #[sea_orm(string_value = "accepted")]
    Accepted,
    /// Rejected; no ledger effect.
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<AgreementStatus> for Status {
    fn from(status: AgreementStatus) -> Self {
        match status {
            AgreementStatus::Proposed => Self::Proposed,
            AgreementStatus::Accepted => Self::Accepted,
            AgreementStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<Status> for AgreementStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Proposed => Self::Proposed,
            Status::Accepted => Self::Accepted,
            Status::Rejected => Self::Rejected,
        }
    }
}

/// A netting proposal between two members, immutable once resolved.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "settlement_agreements")]
pub struct Model {
    /// Agreement id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// The team both members belong to.
    pub team_id: Uuid,
    /// The proposing member.
    pub proposer: Uuid,
    /// The responding member.
    pub responder: Uuid,
    /// Total the proposer owes across the pinned settlements.
    pub proposer_owes: Decimal,
    /// Total the responder owes across the pinned settlements.
    pub responder_owes: Decimal,
    /// Lifecycle status.
    pub status: Status,
    /// The exact settlement ids being netted (JSON array of UUIDs).
    pub settlement_ids: Json,
    /// Proposal time.
    pub proposed_at: DateTimeWithTimeZone,
    /// Resolution time.
    pub responded_at: Option<DateTimeWithTimeZone>,
}

/// Entity relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
