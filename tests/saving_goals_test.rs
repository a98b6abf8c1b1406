/*!
 * Saving Goals Integration Tests
 *
 * Covers owner-scoped saving goal CRUD, the default current amount and
 * amount validation.
 */

mod common;

use common::*;
use finance_tracker::error::ApiError;
use finance_tracker::models::{CreateSavingGoalPayload, UpdateSavingGoalPayload};
use finance_tracker::saving_goals::{
    create_saving_goal, list_saving_goals, remove_saving_goal, update_saving_goal,
};

fn payload(title: &str, target: f64) -> CreateSavingGoalPayload {
    CreateSavingGoalPayload {
        title: title.to_string(),
        target_amount: target,
        current_amount: None,
    }
}

#[tokio::test]
async fn current_amount_defaults_to_zero() {
    let (db, _temp_dir) = setup_test_environment().await;
    let user = create_test_user(&db, "rahul").await;

    let goal = create_saving_goal(&db, &user.id, &payload("Laptop", 80000.0))
        .await
        .unwrap();

    assert_eq!(goal.current_amount, 0.0);
    assert_eq!(goal.progress_percent(), 0.0);
    assert_eq!(list_saving_goals(&db, &user.id).await.unwrap(), vec![goal]);
}

#[tokio::test]
async fn progress_updates_are_persisted() {
    let (db, _temp_dir) = setup_test_environment().await;
    let user = create_test_user(&db, "rahul").await;
    let goal = create_saving_goal(&db, &user.id, &payload("Laptop", 80000.0))
        .await
        .unwrap();

    let updated = update_saving_goal(
        &db,
        &user.id,
        &goal.id,
        &UpdateSavingGoalPayload {
            current_amount: Some(20000.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.current_amount, 20000.0);
    assert_eq!(updated.target_amount, 80000.0);
    assert_eq!(updated.title, "Laptop");
    assert_eq!(updated.progress_percent(), 25.0);
    assert_eq!(list_saving_goals(&db, &user.id).await.unwrap(), vec![updated]);
}

#[tokio::test]
async fn negative_amounts_are_rejected() {
    let (db, _temp_dir) = setup_test_environment().await;
    let user = create_test_user(&db, "rahul").await;

    let negative_target = create_saving_goal(&db, &user.id, &payload("Laptop", -1.0)).await;
    let negative_current = create_saving_goal(
        &db,
        &user.id,
        &CreateSavingGoalPayload {
            current_amount: Some(-10.0),
            ..payload("Laptop", 100.0)
        },
    )
    .await;

    assert!(matches!(negative_target, Err(ApiError::Validation(_))));
    assert!(matches!(negative_current, Err(ApiError::Validation(_))));
}

#[tokio::test]
async fn goals_are_isolated_between_users() {
    let (db, _temp_dir) = setup_test_environment().await;
    let owner = create_test_user(&db, "rahul").await;
    let intruder = create_test_user(&db, "priya").await;
    let goal = create_saving_goal(&db, &owner.id, &payload("Laptop", 80000.0))
        .await
        .unwrap();

    assert!(list_saving_goals(&db, &intruder.id).await.unwrap().is_empty());
    assert_eq!(
        remove_saving_goal(&db, &intruder.id, &goal.id).await.unwrap_err(),
        ApiError::NotFound("Savings goal not found".to_string())
    );

    remove_saving_goal(&db, &owner.id, &goal.id).await.unwrap();
    assert!(list_saving_goals(&db, &owner.id).await.unwrap().is_empty());
}
