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
    CreateReminderPayload, MessageResponse, PublicUser, Reminder, UpdateReminderPayload,
};
use crate::utils::{new_id, require_any_field, timestamp_to_datetime, validate_string_length};

const REMINDER_NOT_FOUND: &str = "Reminder not found";

pub fn extract_reminder_from_row(row: libsql::Row) -> ApiResult<Reminder> {
    let due_date: i64 = row.get(2)?;
    let is_completed: i64 = row.get(3)?;
    Ok(Reminder {
        id: row.get(0)?,
        title: row.get(1)?,
        due_date: timestamp_to_datetime(due_date)?,
        is_completed: is_completed != 0,
        user: row.get(4)?,
    })
}

pub async fn create_reminder(
    db: &Db,
    owner_id: &str,
    payload: &CreateReminderPayload,
) -> ApiResult<Reminder> {
    validate_string_length(&payload.title, "Title", MAX_TITLE_LENGTH)?;

    let reminder = Reminder {
        id: new_id(),
        title: payload.title.trim().to_string(),
        due_date: payload.due_date,
        is_completed: payload.is_completed.unwrap_or(false),
        user: owner_id.to_string(),
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO reminders (id, user_id, title, due_date, is_completed) VALUES (?, ?, ?, ?, ?)",
        (
            reminder.id.as_str(),
            owner_id,
            reminder.title.as_str(),
            reminder.due_date.unix_timestamp(),
            reminder.is_completed as i64,
        ),
    )
    .await?;

    Ok(reminder)
}

/// Soonest due first.
pub async fn list_reminders(db: &Db, owner_id: &str) -> ApiResult<Vec<Reminder>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, title, due_date, is_completed, user_id FROM reminders WHERE user_id = ? ORDER BY due_date ASC, rowid ASC",
            [owner_id],
        )
        .await?;

    let mut reminders = Vec::new();
    while let Some(row) = rows.next().await? {
        reminders.push(extract_reminder_from_row(row)?);
    }
    Ok(reminders)
}

pub async fn update_reminder(
    db: &Db,
    owner_id: &str,
    reminder_id: &str,
    payload: &UpdateReminderPayload,
) -> ApiResult<Reminder> {
    require_any_field(&[
        payload.title.is_some(),
        payload.due_date.is_some(),
        payload.is_completed.is_some(),
    ])?;
    if let Some(title) = &payload.title {
        validate_string_length(title, "Title", MAX_TITLE_LENGTH)?;
    }

    let conn = db.write().await;
    let mut rows = conn
        .query(
            "SELECT id, title, due_date, is_completed, user_id FROM reminders WHERE id = ? AND user_id = ?",
            [reminder_id, owner_id],
        )
        .await?;
    let existing = match rows.next().await? {
        Some(row) => extract_reminder_from_row(row)?,
        None => return Err(ApiError::not_found(REMINDER_NOT_FOUND)),
    };

    let updated = Reminder {
        title: payload
            .title
            .as_deref()
            .map(|t| t.trim().to_string())
            .unwrap_or(existing.title),
        due_date: payload.due_date.unwrap_or(existing.due_date),
        is_completed: payload.is_completed.unwrap_or(existing.is_completed),
        ..existing
    };

    let affected = conn
        .execute(
            "UPDATE reminders SET title = ?, due_date = ?, is_completed = ? WHERE id = ? AND user_id = ?",
            (
                updated.title.as_str(),
                updated.due_date.unix_timestamp(),
                updated.is_completed as i64,
                reminder_id,
                owner_id,
            ),
        )
        .await?;

    if affected == 0 {
        return Err(ApiError::not_found(REMINDER_NOT_FOUND));
    }
    Ok(updated)
}

pub async fn remove_reminder(db: &Db, owner_id: &str, reminder_id: &str) -> ApiResult<()> {
    let conn = db.write().await;
    let affected = conn
        .execute(
            "DELETE FROM reminders WHERE id = ? AND user_id = ?",
            [reminder_id, owner_id],
        )
        .await?;

    if affected == 0 {
        return Err(ApiError::not_found(REMINDER_NOT_FOUND));
    }
    Ok(())
}

pub async fn post_reminder(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    ValidatedJson(payload): ValidatedJson<CreateReminderPayload>,
) -> ApiResult<(StatusCode, Json<Reminder>)> {
    let reminder = create_reminder(&state.db, &user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

pub async fn get_reminders(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
) -> ApiResult<(StatusCode, Json<Vec<Reminder>>)> {
    let reminders = list_reminders(&state.db, &user.id).await?;
    Ok((StatusCode::OK, Json(reminders)))
}

pub async fn put_reminder(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    Path(reminder_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateReminderPayload>,
) -> ApiResult<(StatusCode, Json<Reminder>)> {
    let reminder = update_reminder(&state.db, &user.id, &reminder_id, &payload).await?;
    Ok((StatusCode::OK, Json(reminder)))
}

pub async fn delete_reminder(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    Path(reminder_id): Path<String>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    remove_reminder(&state.db, &user.id, &reminder_id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Reminder deleted successfully")),
    ))
}
