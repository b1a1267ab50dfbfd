//! `SeaORM` entity definitions for the ledger store.

pub mod activities;
pub mod expenses;
pub mod members;
pub mod settlement_agreements;
pub mod settlements;
