/*!
 * Expenses Integration Tests
 *
 * Exercises the owner-scoped expense operations against a real database:
 * - Create/list round trips and newest-first ordering
 * - Partial updates merging only the supplied fields
 * - Ownership isolation (another user's ids behave like missing ids)
 * - Field validation before any store access
 * - CSV export ordering
 *
 * All tests use isolated temporary databases.
 */

mod common;

use common::*;
use finance_tracker::error::ApiError;
use finance_tracker::export::expenses_to_csv;
use finance_tracker::expenses::{
    DateOrder, create_expense, list_expenses, remove_expense, update_expense,
};
use finance_tracker::models::{CreateExpensePayload, UpdateExpensePayload};
use finance_tracker::utils::timestamp_to_datetime;

fn payload(title: &str, amount: f64, category: &str, timestamp: Option<i64>) -> CreateExpensePayload {
    CreateExpensePayload {
        title: title.to_string(),
        amount,
        category: category.to_string(),
        date: timestamp.map(|ts| timestamp_to_datetime(ts).unwrap()),
    }
}

#[tokio::test]
async fn empty_list_for_new_user() {
    let (db, _temp_dir) = setup_test_environment().await;
    let user = create_test_user(&db, "rahul").await;

    let expenses = list_expenses(&db, &user.id, DateOrder::NewestFirst).await.unwrap();

    assert!(expenses.is_empty());
}

#[tokio::test]
async fn created_expense_is_listed_with_server_fields() {
    let (db, _temp_dir) = setup_test_environment().await;
    let user = create_test_user(&db, "rahul").await;

    let created = create_expense(&db, &user.id, &payload("Food", 500.0, "Groceries", None))
        .await
        .unwrap();
    let expenses = list_expenses(&db, &user.id, DateOrder::NewestFirst).await.unwrap();

    assert_eq!(expenses, vec![created.clone()]);
    assert_eq!(created.title, "Food");
    assert_eq!(created.amount, 500.0);
    assert_eq!(created.category, "Groceries");
    assert_eq!(created.user, user.id);
    assert!(!created.id.is_empty());
}

#[tokio::test]
async fn other_users_see_nothing() {
    let (db, _temp_dir) = setup_test_environment().await;
    let owner = create_test_user(&db, "rahul").await;
    let other = create_test_user(&db, "priya").await;

    create_expense(&db, &owner.id, &payload("Food", 500.0, "Groceries", None))
        .await
        .unwrap();

    let seen = list_expenses(&db, &other.id, DateOrder::NewestFirst).await.unwrap();
    assert!(seen.is_empty());
}

#[tokio::test]
async fn listing_is_newest_first_and_export_oldest_first() {
    let (db, _temp_dir) = setup_test_environment().await;
    let user = create_test_user(&db, "rahul").await;

    for (offset, title) in [(100, "Middle"), (0, "Old"), (200, "New")] {
        create_expense(
            &db,
            &user.id,
            &payload(title, 10.0, "misc", Some(TEST_BASE_TIMESTAMP + offset)),
        )
        .await
        .unwrap();
    }

    let newest_first: Vec<String> = list_expenses(&db, &user.id, DateOrder::NewestFirst)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();
    let oldest_first: Vec<String> = list_expenses(&db, &user.id, DateOrder::OldestFirst)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();

    assert_eq!(newest_first, ["New", "Middle", "Old"]);
    assert_eq!(oldest_first, ["Old", "Middle", "New"]);
}

#[tokio::test]
async fn update_merges_only_supplied_fields() {
    let (db, _temp_dir) = setup_test_environment().await;
    let user = create_test_user(&db, "rahul").await;
    let created = create_expense(
        &db,
        &user.id,
        &payload("Food", 500.0, "Groceries", Some(TEST_BASE_TIMESTAMP)),
    )
    .await
    .unwrap();

    let updated = update_expense(
        &db,
        &user.id,
        &created.id,
        &UpdateExpensePayload {
            amount: Some(650.25),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.amount, 650.25);
    assert_eq!(updated.title, created.title);
    assert_eq!(updated.category, created.category);
    assert_eq!(updated.date, created.date);

    let listed = list_expenses(&db, &user.id, DateOrder::NewestFirst).await.unwrap();
    assert_eq!(listed, vec![updated]);
}

#[tokio::test]
async fn foreign_and_missing_ids_are_indistinguishable() {
    let (db, _temp_dir) = setup_test_environment().await;
    let owner = create_test_user(&db, "rahul").await;
    let intruder = create_test_user(&db, "priya").await;
    let created = create_expense(&db, &owner.id, &payload("Food", 500.0, "Groceries", None))
        .await
        .unwrap();
    let change = UpdateExpensePayload {
        title: Some("Hijacked".to_string()),
        ..Default::default()
    };

    let foreign_update = update_expense(&db, &intruder.id, &created.id, &change)
        .await
        .unwrap_err();
    let missing_update = update_expense(&db, &intruder.id, "no-such-id", &change)
        .await
        .unwrap_err();
    let foreign_delete = remove_expense(&db, &intruder.id, &created.id).await.unwrap_err();
    let missing_delete = remove_expense(&db, &intruder.id, "no-such-id").await.unwrap_err();

    assert_eq!(foreign_update, missing_update);
    assert_eq!(foreign_delete, missing_delete);
    assert_eq!(foreign_update, ApiError::NotFound("Expense not found".to_string()));

    // The owner's record is untouched.
    let listed = list_expenses(&db, &owner.id, DateOrder::NewestFirst).await.unwrap();
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn delete_removes_the_record() {
    let (db, _temp_dir) = setup_test_environment().await;
    let user = create_test_user(&db, "rahul").await;
    let keep = create_expense(&db, &user.id, &payload("Keep", 1.0, "misc", None))
        .await
        .unwrap();
    let dropped = create_expense(&db, &user.id, &payload("Drop", 2.0, "misc", None))
        .await
        .unwrap();

    remove_expense(&db, &user.id, &dropped.id).await.unwrap();

    let listed = list_expenses(&db, &user.id, DateOrder::NewestFirst).await.unwrap();
    assert_eq!(listed, vec![keep]);
    assert!(remove_expense(&db, &user.id, &dropped.id).await.is_err());
}

#[tokio::test]
async fn invalid_fields_are_rejected() {
    let (db, _temp_dir) = setup_test_environment().await;
    let user = create_test_user(&db, "rahul").await;

    for bad in [
        payload("  ", 10.0, "misc", None),
        payload("Food", -1.0, "misc", None),
        payload("Food", f64::NAN, "misc", None),
        payload("Food", 10.0, "", None),
    ] {
        let result = create_expense(&db, &user.id, &bad).await;
        assert!(matches!(result, Err(ApiError::Validation(_))), "{:?}", bad);
    }

    let empty_update = update_expense(&db, &user.id, "whatever", &UpdateExpensePayload::default())
        .await
        .unwrap_err();
    assert!(matches!(empty_update, ApiError::Validation(_)));

    let listed = list_expenses(&db, &user.id, DateOrder::NewestFirst).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn export_matches_the_documented_layout() {
    let (db, _temp_dir) = setup_test_environment().await;
    let user = create_test_user(&db, "rahul").await;
    create_expense(
        &db,
        &user.id,
        &payload("Food", 500.0, "Groceries", Some(TEST_BASE_TIMESTAMP)),
    )
    .await
    .unwrap();

    let expenses = list_expenses(&db, &user.id, DateOrder::OldestFirst).await.unwrap();
    let csv = expenses_to_csv(&expenses).unwrap();

    assert_eq!(
        csv,
        "Title,Amount,Category,Date\nFood,500,Groceries,2023-11-14T22:13:20Z"
    );
}
