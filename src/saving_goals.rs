use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::AppState;
use crate::constants::MAX_TITLE_LENGTH;
use crate::database::Db;
use crate::error::{ApiError, ApiResult, ValidatedJson};
use crate::models::{
    CreateSavingGoalPayload, MessageResponse, PublicUser, SavingGoal, UpdateSavingGoalPayload,
};
use crate::utils::{new_id, require_any_field, validate_amount, validate_string_length};

const GOAL_NOT_FOUND: &str = "Savings goal not found";

pub fn extract_saving_goal_from_row(row: libsql::Row) -> ApiResult<SavingGoal> {
    Ok(SavingGoal {
        id: row.get(0)?,
        title: row.get(1)?,
        target_amount: row.get(2)?,
        current_amount: row.get(3)?,
        user: row.get(4)?,
    })
}

pub async fn create_saving_goal(
    db: &Db,
    owner_id: &str,
    payload: &CreateSavingGoalPayload,
) -> ApiResult<SavingGoal> {
    validate_string_length(&payload.title, "Title", MAX_TITLE_LENGTH)?;
    validate_amount(payload.target_amount, "Target amount")?;
    let current_amount = payload.current_amount.unwrap_or(0.0);
    validate_amount(current_amount, "Current amount")?;

    let goal = SavingGoal {
        id: new_id(),
        title: payload.title.trim().to_string(),
        target_amount: payload.target_amount,
        current_amount,
        user: owner_id.to_string(),
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO saving_goals (id, user_id, title, target_amount, current_amount) VALUES (?, ?, ?, ?, ?)",
        (
            goal.id.as_str(),
            owner_id,
            goal.title.as_str(),
            goal.target_amount,
            goal.current_amount,
        ),
    )
    .await?;

    Ok(goal)
}

pub async fn list_saving_goals(db: &Db, owner_id: &str) -> ApiResult<Vec<SavingGoal>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, title, target_amount, current_amount, user_id FROM saving_goals WHERE user_id = ?",
            [owner_id],
        )
        .await?;

    let mut goals = Vec::new();
    while let Some(row) = rows.next().await? {
        goals.push(extract_saving_goal_from_row(row)?);
    }
    Ok(goals)
}

pub async fn update_saving_goal(
    db: &Db,
    owner_id: &str,
    goal_id: &str,
    payload: &UpdateSavingGoalPayload,
) -> ApiResult<SavingGoal> {
    require_any_field(&[
        payload.title.is_some(),
        payload.target_amount.is_some(),
        payload.current_amount.is_some(),
    ])?;
    if let Some(title) = &payload.title {
        validate_string_length(title, "Title", MAX_TITLE_LENGTH)?;
    }
    if let Some(target) = payload.target_amount {
        validate_amount(target, "Target amount")?;
    }
    if let Some(current) = payload.current_amount {
        validate_amount(current, "Current amount")?;
    }

    let conn = db.write().await;
    let mut rows = conn
        .query(
            "SELECT id, title, target_amount, current_amount, user_id FROM saving_goals WHERE id = ? AND user_id = ?",
            [goal_id, owner_id],
        )
        .await?;
    let existing = match rows.next().await? {
        Some(row) => extract_saving_goal_from_row(row)?,
        None => return Err(ApiError::not_found(GOAL_NOT_FOUND)),
    };

    let updated = SavingGoal {
        title: payload
            .title
            .as_deref()
            .map(|t| t.trim().to_string())
            .unwrap_or(existing.title),
        target_amount: payload.target_amount.unwrap_or(existing.target_amount),
        current_amount: payload.current_amount.unwrap_or(existing.current_amount),
        ..existing
    };

    let affected = conn
        .execute(
            "UPDATE saving_goals SET title = ?, target_amount = ?, current_amount = ? WHERE id = ? AND user_id = ?",
            (
                updated.title.as_str(),
                updated.target_amount,
                updated.current_amount,
                goal_id,
                owner_id,
            ),
        )
        .await?;

    if affected == 0 {
        return Err(ApiError::not_found(GOAL_NOT_FOUND));
    }
    Ok(updated)
}

pub async fn remove_saving_goal(db: &Db, owner_id: &str, goal_id: &str) -> ApiResult<()> {
    let conn = db.write().await;
    let affected = conn
        .execute(
            "DELETE FROM saving_goals WHERE id = ? AND user_id = ?",
            [goal_id, owner_id],
        )
        .await?;

    if affected == 0 {
        return Err(ApiError::not_found(GOAL_NOT_FOUND));
    }
    Ok(())
}

pub async fn post_saving_goal(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    ValidatedJson(payload): ValidatedJson<CreateSavingGoalPayload>,
) -> ApiResult<(StatusCode, Json<SavingGoal>)> {
    let goal = create_saving_goal(&state.db, &user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn get_saving_goals(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
) -> ApiResult<(StatusCode, Json<Vec<SavingGoal>>)> {
    let goals = list_saving_goals(&state.db, &user.id).await?;
    Ok((StatusCode::OK, Json(goals)))
}

pub async fn put_saving_goal(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    Path(goal_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateSavingGoalPayload>,
) -> ApiResult<(StatusCode, Json<SavingGoal>)> {
    let goal = update_saving_goal(&state.db, &user.id, &goal_id, &payload).await?;
    Ok((StatusCode::OK, Json(goal)))
}

pub async fn delete_saving_goal(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    Path(goal_id): Path<String>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    remove_saving_goal(&state.db, &user.id, &goal_id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Savings goal deleted successfully")),
    ))
}
