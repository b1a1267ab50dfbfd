//! Recalculation planner.
//!
//! Re-derives settlement amounts after a membership change. The planner
//! collects every intended mutation into a [`RecalcPlan`] first, validates
//! the whole batch, and only then hands it to the repository for atomic
//! application. Rows in `unconfirmed` or `paid` status are never touched:
//! money already tendered or attested is never retroactively changed.

use std::collections::{BTreeSet, HashSet};

use rust_decimal::Decimal;
use splitledger_shared::types::{ExpenseId, SettlementId, UserId};

use super::error::MembershipError;
use crate::settlement::SettlementStatus;
use crate::split::even_share;

/// One non-deleted settlement on an affected expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementSnapshot {
    /// Settlement id.
    pub id: SettlementId,
    /// Member owing the settlement.
    pub owed_by: UserId,
    /// Current status.
    pub status: SettlementStatus,
    /// Current amount owed.
    pub amount: Decimal,
}

/// One non-deleted expense with its non-deleted settlements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseSnapshot {
    /// Expense id.
    pub id: ExpenseId,
    /// Payer of the expense.
    pub payer: UserId,
    /// Expense amount.
    pub amount: Decimal,
    /// The expense's settlements.
    pub settlements: Vec<SettlementSnapshot>,
}

impl ExpenseSnapshot {
    /// Whether any obligation on this expense is still outstanding.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.settlements
            .iter()
            .any(|s| s.status == SettlementStatus::Pending)
    }
}

/// What caused a member addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdditionTrigger {
    /// The member joined through an invite. Expenses the joiner paid are
    /// skipped entirely: a self-paid expense never needs a settlement for
    /// its own payer.
    Join,
    /// An administrator added the member. The payer is necessarily an
    /// existing, different member in this path, so no expense is skipped.
    AdminAdd,
}

/// A settlement row to be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSettlement {
    /// The expense the row belongs to.
    pub expense: ExpenseId,
    /// Member owing the new row.
    pub owed_by: UserId,
    /// Amount owed.
    pub amount: Decimal,
}

/// Row counts applied by a recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecalcCounts {
    /// Pending rows whose amount was re-derived.
    pub updated: usize,
    /// Rows inserted for members missing from an expense.
    pub created: usize,
    /// Pending rows removed for departed members.
    pub removed: usize,
    /// Expenses visited.
    pub expenses: usize,
}

/// A validated batch of settlement mutations.
///
/// Collected in memory first so the whole batch can be checked before any
/// row changes; partial application is never visible to concurrent readers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecalcPlan {
    /// (settlement, new amount) for pending rows being re-derived.
    pub updates: Vec<(SettlementId, Decimal)>,
    /// Rows to insert with status `pending`.
    pub inserts: Vec<NewSettlement>,
    /// Pending rows to remove (maintenance only).
    pub deletes: Vec<SettlementId>,
    /// Number of expenses the plan touches.
    pub expenses_affected: usize,
}

impl RecalcPlan {
    /// Whether the plan mutates anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty() && self.deletes.is_empty()
    }

    /// Row counts for the audit summary.
    #[must_use]
    pub fn counts(&self) -> RecalcCounts {
        RecalcCounts {
            updated: self.updates.len(),
            created: self.inserts.len(),
            removed: self.deletes.len(),
            expenses: self.expenses_affected,
        }
    }

    /// Validates the batch against the snapshot it was planned from.
    ///
    /// Rejects duplicate (expense, member) pairs among the inserts, inserts
    /// that would duplicate a surviving row, inserts for an expense's own
    /// payer, and non-positive amounts anywhere in the plan.
    ///
    /// # Errors
    ///
    /// Returns the first violated batch invariant.
    pub fn validate(&self, expenses: &[ExpenseSnapshot]) -> Result<(), MembershipError> {
        for (id, amount) in &self.updates {
            let expense = expenses
                .iter()
                .find(|e| e.settlements.iter().any(|s| s.id == *id));
            if *amount <= Decimal::ZERO {
                let expense_id = expense.map_or_else(ExpenseId::new, |e| e.id);
                return Err(MembershipError::NonPositiveShare(expense_id));
            }
        }

        let deleted: HashSet<SettlementId> = self.deletes.iter().copied().collect();
        let mut planned: HashSet<(ExpenseId, UserId)> = HashSet::new();

        for insert in &self.inserts {
            if insert.amount <= Decimal::ZERO {
                return Err(MembershipError::NonPositiveShare(insert.expense));
            }
            if !planned.insert((insert.expense, insert.owed_by)) {
                return Err(MembershipError::DuplicatePair {
                    expense: insert.expense,
                    user: insert.owed_by,
                });
            }

            let expense = expenses.iter().find(|e| e.id == insert.expense);
            if let Some(expense) = expense {
                if insert.owed_by == expense.payer {
                    return Err(MembershipError::DuplicatePair {
                        expense: insert.expense,
                        user: insert.owed_by,
                    });
                }
                let survives = expense
                    .settlements
                    .iter()
                    .any(|s| s.owed_by == insert.owed_by && !deleted.contains(&s.id));
                if survives {
                    return Err(MembershipError::DuplicatePair {
                        expense: insert.expense,
                        user: insert.owed_by,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Plans the recalculation for a member joining or being added.
///
/// Selects every expense with at least one `pending` settlement (for the
/// join trigger, skipping expenses the joiner paid), re-derives the even
/// share against `new_count`, updates every pending row to the new share,
/// and inserts one pending row for the joiner on each affected expense they
/// do not already appear on.
///
/// # Errors
///
/// Returns a split error for invalid amounts or counts, or a batch
/// invariant violation detected during validation.
pub fn plan_member_addition(
    expenses: &[ExpenseSnapshot],
    joiner: UserId,
    new_count: usize,
    trigger: AdditionTrigger,
) -> Result<RecalcPlan, MembershipError> {
    let mut plan = RecalcPlan::default();

    for expense in expenses {
        if !expense.has_pending() {
            continue;
        }
        if trigger == AdditionTrigger::Join && expense.payer == joiner {
            continue;
        }

        let share = even_share(expense.amount, new_count)?;
        plan.expenses_affected += 1;

        for settlement in &expense.settlements {
            if settlement.status == SettlementStatus::Pending {
                plan.updates.push((settlement.id, share));
            }
        }

        let already_present = expense.settlements.iter().any(|s| s.owed_by == joiner);
        if !already_present && expense.payer != joiner {
            plan.inserts.push(NewSettlement {
                expense: expense.id,
                owed_by: joiner,
                amount: share,
            });
        }
    }

    plan.validate(expenses)?;
    Ok(plan)
}

/// Plans the administrator-invoked maintenance recalculation.
///
/// A convergence pass for drift after unrecorded membership changes:
/// re-derives every pending settlement against the current active member
/// set, removes pending rows owed by departed users, and inserts missing
/// rows for active members. Attested and paid rows are left untouched even
/// when their owner has departed; the ledger keeps resolved history.
///
/// # Errors
///
/// `NoActiveMembers` for an empty roster, otherwise as
/// [`plan_member_addition`].
pub fn plan_maintenance(
    expenses: &[ExpenseSnapshot],
    active: &BTreeSet<UserId>,
) -> Result<RecalcPlan, MembershipError> {
    if active.is_empty() {
        return Err(MembershipError::NoActiveMembers);
    }

    let mut plan = RecalcPlan::default();

    for expense in expenses {
        if !expense.has_pending() {
            continue;
        }

        let share = even_share(expense.amount, active.len())?;
        plan.expenses_affected += 1;

        let mut present: HashSet<UserId> = HashSet::new();
        for settlement in &expense.settlements {
            present.insert(settlement.owed_by);
            if settlement.status != SettlementStatus::Pending {
                continue;
            }
            if active.contains(&settlement.owed_by) {
                plan.updates.push((settlement.id, share));
            } else {
                plan.deletes.push(settlement.id);
            }
        }

        for user in active {
            if *user != expense.payer && !present.contains(user) {
                plan.inserts.push(NewSettlement {
                    expense: expense.id,
                    owed_by: *user,
                    amount: share,
                });
            }
        }
    }

    plan.validate(expenses)?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pending(owed_by: UserId, amount: Decimal) -> SettlementSnapshot {
        SettlementSnapshot {
            id: SettlementId::new(),
            owed_by,
            status: SettlementStatus::Pending,
            amount,
        }
    }

    fn with_status(owed_by: UserId, amount: Decimal, status: SettlementStatus) -> SettlementSnapshot {
        SettlementSnapshot {
            id: SettlementId::new(),
            owed_by,
            status,
            amount,
        }
    }

    #[test]
    fn test_join_recalculates_pending_rows_and_adds_joiner() {
        // A paid 300 in a team of three: B and C owe 100 each.
        let (a, b, c, d) = (UserId::new(), UserId::new(), UserId::new(), UserId::new());
        let expense = ExpenseSnapshot {
            id: ExpenseId::new(),
            payer: a,
            amount: dec!(300),
            settlements: vec![pending(b, dec!(100)), pending(c, dec!(100))],
        };

        // D joins: everyone's share becomes 75.
        let plan = plan_member_addition(&[expense], d, 4, AdditionTrigger::Join).unwrap();
        assert_eq!(plan.updates.len(), 2);
        assert!(plan.updates.iter().all(|(_, amount)| *amount == dec!(75)));
        assert_eq!(
            plan.inserts,
            vec![NewSettlement {
                expense: plan.inserts[0].expense,
                owed_by: d,
                amount: dec!(75),
            }]
        );
        assert!(plan.deletes.is_empty());
        assert_eq!(plan.expenses_affected, 1);
    }

    #[test]
    fn test_join_leaves_attested_rows_untouched() {
        let (a, b, c, d) = (UserId::new(), UserId::new(), UserId::new(), UserId::new());
        let paid_row = with_status(b, dec!(100), SettlementStatus::Paid);
        let unconfirmed_row = with_status(c, dec!(100), SettlementStatus::Unconfirmed);
        let pending_row = pending(UserId::new(), dec!(100));
        let expense = ExpenseSnapshot {
            id: ExpenseId::new(),
            payer: a,
            amount: dec!(300),
            settlements: vec![paid_row, unconfirmed_row, pending_row],
        };

        let plan = plan_member_addition(&[expense], d, 4, AdditionTrigger::Join).unwrap();
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].0, pending_row.id);
    }

    #[test]
    fn test_join_skips_expenses_paid_by_joiner() {
        let (rejoiner, b) = (UserId::new(), UserId::new());
        let expense = ExpenseSnapshot {
            id: ExpenseId::new(),
            payer: rejoiner,
            amount: dec!(100),
            settlements: vec![pending(b, dec!(50))],
        };

        let plan = plan_member_addition(&[expense], rejoiner, 3, AdditionTrigger::Join).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_admin_add_does_not_skip_payer_expenses() {
        let (payer, debtor, added) = (UserId::new(), UserId::new(), UserId::new());
        let expense = ExpenseSnapshot {
            id: ExpenseId::new(),
            payer,
            amount: dec!(90),
            settlements: vec![pending(debtor, dec!(45))],
        };

        let plan = plan_member_addition(&[expense.clone()], added, 3, AdditionTrigger::AdminAdd).unwrap();
        assert_eq!(plan.updates, vec![(expense.settlements[0].id, dec!(30))]);
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].owed_by, added);
        assert_eq!(plan.inserts[0].amount, dec!(30));
    }

    #[test]
    fn test_no_insert_when_joiner_already_has_a_row() {
        let (payer, rejoiner) = (UserId::new(), UserId::new());
        let expense = ExpenseSnapshot {
            id: ExpenseId::new(),
            payer,
            amount: dec!(100),
            settlements: vec![pending(rejoiner, dec!(50))],
        };

        let plan =
            plan_member_addition(&[expense], rejoiner, 2, AdditionTrigger::AdminAdd).unwrap();
        assert!(plan.inserts.is_empty());
        assert_eq!(plan.updates.len(), 1);
    }

    #[test]
    fn test_fully_settled_expenses_are_skipped() {
        let (payer, debtor, joiner) = (UserId::new(), UserId::new(), UserId::new());
        let expense = ExpenseSnapshot {
            id: ExpenseId::new(),
            payer,
            amount: dec!(100),
            settlements: vec![with_status(debtor, dec!(50), SettlementStatus::Paid)],
        };

        let plan = plan_member_addition(&[expense], joiner, 3, AdditionTrigger::Join).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.expenses_affected, 0);
    }

    #[test]
    fn test_maintenance_removes_departed_and_fills_missing() {
        let (payer, departed, active_debtor, newcomer) =
            (UserId::new(), UserId::new(), UserId::new(), UserId::new());
        let departed_row = pending(departed, dec!(40));
        let active_row = pending(active_debtor, dec!(40));
        let expense = ExpenseSnapshot {
            id: ExpenseId::new(),
            payer,
            amount: dec!(120),
            settlements: vec![departed_row, active_row],
        };

        let roster: BTreeSet<UserId> = [payer, active_debtor, newcomer].into_iter().collect();
        let plan = plan_maintenance(&[expense], &roster).unwrap();

        assert_eq!(plan.deletes, vec![departed_row.id]);
        assert_eq!(plan.updates, vec![(active_row.id, dec!(40))]);
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].owed_by, newcomer);
        assert_eq!(plan.counts().removed, 1);
        assert_eq!(plan.counts().created, 1);
        assert_eq!(plan.counts().updated, 1);
    }

    #[test]
    fn test_maintenance_keeps_departed_paid_rows() {
        let (payer, departed, debtor) = (UserId::new(), UserId::new(), UserId::new());
        let paid_row = with_status(departed, dec!(50), SettlementStatus::Paid);
        let expense = ExpenseSnapshot {
            id: ExpenseId::new(),
            payer,
            amount: dec!(100),
            settlements: vec![paid_row, pending(debtor, dec!(50))],
        };

        let roster: BTreeSet<UserId> = [payer, debtor].into_iter().collect();
        let plan = plan_maintenance(&[expense], &roster).unwrap();
        assert!(plan.deletes.is_empty());
    }

    #[test]
    fn test_maintenance_rejects_empty_roster() {
        assert_eq!(
            plan_maintenance(&[], &BTreeSet::new()),
            Err(MembershipError::NoActiveMembers)
        );
    }

    #[test]
    fn test_validate_rejects_duplicate_insert_pairs() {
        let expense = ExpenseId::new();
        let user = UserId::new();
        let plan = RecalcPlan {
            inserts: vec![
                NewSettlement {
                    expense,
                    owed_by: user,
                    amount: dec!(10),
                },
                NewSettlement {
                    expense,
                    owed_by: user,
                    amount: dec!(10),
                },
            ],
            ..RecalcPlan::default()
        };
        assert_eq!(
            plan.validate(&[]),
            Err(MembershipError::DuplicatePair { expense, user })
        );
    }

    #[test]
    fn test_validate_rejects_non_positive_insert() {
        let plan = RecalcPlan {
            inserts: vec![NewSettlement {
                expense: ExpenseId::new(),
                owed_by: UserId::new(),
                amount: dec!(0),
            }],
            ..RecalcPlan::default()
        };
        assert!(matches!(
            plan.validate(&[]),
            Err(MembershipError::NonPositiveShare(_))
        ));
    }
}
