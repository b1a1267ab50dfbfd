//! Expense creation, installment plans, note edits, and soft deletion.

mod common;

use rust_decimal_macros::dec;
use splitledger_db::repositories::ExpenseError;
use splitledger_db::{ActivityRepository, ExpenseRepository};
use splitledger_shared::types::{ExpenseId, UserId};

#[tokio::test]
async fn even_split_creates_one_pending_row_per_non_payer() {
    let db = common::connect().await;
    let (team, users) = common::team_with_members(&db, 3).await;
    let repo = ExpenseRepository::new(db.clone());

    let created = repo
        .create_expense(team, users[0], dec!(300), "groceries", None)
        .await
        .unwrap();

    assert_eq!(created.expense.amount, dec!(300));
    assert_eq!(created.settlements.len(), 2);
    for row in &created.settlements {
        assert_eq!(row.amount_owed, dec!(100));
        assert_eq!(row.status, splitledger_db::entities::settlements::Status::Pending);
        assert_ne!(row.owed_by, users[0].into_inner());
        assert!(row.paid_at.is_none());
    }

    let activities = ActivityRepository::new(db.clone())
        .list_for_team(team)
        .await
        .unwrap();
    assert!(activities.iter().any(|a| a.action == "expense.created"));
}

#[tokio::test]
async fn non_member_cannot_create_expense() {
    let db = common::connect().await;
    let (team, _) = common::team_with_members(&db, 2).await;
    let repo = ExpenseRepository::new(db.clone());

    let stranger = UserId::new();
    let result = repo
        .create_expense(team, stranger, dec!(50), "coffee", None)
        .await;
    assert!(matches!(result, Err(ExpenseError::NotTeamMember(user)) if user == stranger));
}

#[tokio::test]
async fn non_positive_amount_is_rejected() {
    let db = common::connect().await;
    let (team, users) = common::team_with_members(&db, 2).await;
    let repo = ExpenseRepository::new(db.clone());

    let result = repo
        .create_expense(team, users[0], dec!(0), "coffee", None)
        .await;
    assert!(matches!(result, Err(ExpenseError::Split(_))));

    // Nothing was persisted.
    assert!(repo.list_for_team(team).await.unwrap().is_empty());
}

#[tokio::test]
async fn installment_plan_creates_children_with_round_up_shares() {
    let db = common::connect().await;
    let (team, users) = common::team_with_members(&db, 4).await;
    let repo = ExpenseRepository::new(db.clone());

    // 1200 over 3 months for 4 members: monthly 400, per participant 100.
    let plan = repo
        .create_installment_plan(team, users[0], dec!(1200), 3, "furniture", 15, None)
        .await
        .unwrap();

    assert_eq!(plan.parent.amount, dec!(1200));
    assert!(plan.parent.is_installment);
    assert_eq!(plan.parent.total_installments, Some(3));
    assert_eq!(plan.children.len(), 3);

    for (index, child) in (1i32..).zip(&plan.children) {
        assert_eq!(child.expense.amount, dec!(400));
        assert_eq!(child.expense.installment_index, Some(index));
        assert_eq!(child.expense.parent_expense_id, Some(plan.parent.id));
        assert!(child.expense.due_date.is_some());

        assert_eq!(child.settlements.len(), 3);
        for row in &child.settlements {
            assert_eq!(row.amount_owed, dec!(100));
        }
    }

    // One audit entry summarizes the whole plan.
    let activities = ActivityRepository::new(db.clone())
        .list_for_team(team)
        .await
        .unwrap();
    assert_eq!(
        activities
            .iter()
            .filter(|a| a.action == "expense.plan_created")
            .count(),
        1
    );
}

#[tokio::test]
async fn installment_month_count_is_validated() {
    let db = common::connect().await;
    let (team, users) = common::team_with_members(&db, 2).await;
    let repo = ExpenseRepository::new(db.clone());

    for months in [0, 25] {
        let result = repo
            .create_installment_plan(team, users[0], dec!(100), months, "rent", 1, None)
            .await;
        assert!(matches!(result, Err(ExpenseError::Split(_))));
    }
}

#[tokio::test]
async fn note_edits_are_payer_or_admin_only() {
    let db = common::connect().await;
    let (team, users) = common::team_with_members(&db, 3).await;
    let repo = ExpenseRepository::new(db.clone());

    // users[1] pays; users[0] is the team admin; users[2] is neither.
    let created = repo
        .create_expense(team, users[1], dec!(30), "snacks", None)
        .await
        .unwrap();
    let id = ExpenseId::from_uuid(created.expense.id);

    let updated = repo
        .update_note(id, users[1], Some("team offsite".into()))
        .await
        .unwrap();
    assert_eq!(updated.note.as_deref(), Some("team offsite"));
    assert_eq!(updated.amount, dec!(30));

    let updated = repo.update_note(id, users[0], None).await.unwrap();
    assert!(updated.note.is_none());

    let result = repo.update_note(id, users[2], Some("nope".into())).await;
    assert!(matches!(result, Err(ExpenseError::NotPayerOrAdmin(_))));
}

#[tokio::test]
async fn soft_delete_tombstones_expense_and_settlements() {
    let db = common::connect().await;
    let (team, users) = common::team_with_members(&db, 3).await;
    let repo = ExpenseRepository::new(db.clone());

    let created = repo
        .create_expense(team, users[0], dec!(90), "dinner", None)
        .await
        .unwrap();
    let id = ExpenseId::from_uuid(created.expense.id);

    repo.soft_delete(id, users[1]).await.unwrap();

    assert!(matches!(repo.get(id).await, Err(ExpenseError::NotFound(_))));
    assert!(repo.list_for_team(team).await.unwrap().is_empty());

    // Deleting again is a conflict, not a repeat.
    assert!(matches!(
        repo.soft_delete(id, users[1]).await,
        Err(ExpenseError::AlreadyDeleted(_))
    ));
}

#[tokio::test]
async fn deleting_installment_parent_cascades_to_children() {
    let db = common::connect().await;
    let (team, users) = common::team_with_members(&db, 2).await;
    let repo = ExpenseRepository::new(db.clone());

    let plan = repo
        .create_installment_plan(team, users[0], dec!(600), 2, "appliance", 5, None)
        .await
        .unwrap();

    repo.soft_delete(ExpenseId::from_uuid(plan.parent.id), users[0])
        .await
        .unwrap();

    for child in &plan.children {
        let result = repo.get(ExpenseId::from_uuid(child.expense.id)).await;
        assert!(matches!(result, Err(ExpenseError::NotFound(_))));
    }
}

#[tokio::test]
async fn expense_errors_map_to_the_shared_taxonomy() {
    let db = common::connect().await;
    let (team, _) = common::team_with_members(&db, 2).await;
    let repo = ExpenseRepository::new(db.clone());

    let err = repo
        .create_expense(team, UserId::new(), dec!(10), "coffee", None)
        .await
        .unwrap_err();
    let app: splitledger_shared::AppError = err.into();
    assert_eq!(app.error_code(), "FORBIDDEN");
}
