//! Repository abstractions for data access.
//!
//! Repositories load live rows through the scoping helpers, ask the core
//! crate what a mutation should do, and apply the whole answer inside a
//! single database transaction. Audit entries ride the same transaction;
//! notifications fire after commit.

pub mod activity;
pub mod agreement;
pub mod balance;
pub mod expense;
pub mod member;
pub mod settlement;

pub(crate) mod scope;

pub use activity::ActivityRepository;
pub use agreement::{AgreementError, AgreementRepository};
pub use balance::{BalanceError, BalanceRepository};
pub use expense::{
    CreatedInstallmentPlan, ExpenseError, ExpenseRepository, ExpenseWithSettlements,
};
pub use member::{MemberError, MemberRepository};
pub use settlement::{SettlementError, SettlementRepository};
