use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::AppState;
use crate::constants::{MAX_CATEGORY_LENGTH, MAX_TITLE_LENGTH};
use crate::database::Db;
use crate::error::{ApiError, ApiResult, ValidatedJson};
use crate::models::{
    CreateExpensePayload, Expense, MessageResponse, PublicUser, UpdateExpensePayload,
};
use crate::utils::{
    new_id, now_utc, require_any_field, timestamp_to_datetime, validate_amount,
    validate_string_length,
};

const EXPENSE_NOT_FOUND: &str = "Expense not found";
const SELECT_EXPENSE: &str = "SELECT id, title, amount, category, date, user_id FROM expenses";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    NewestFirst,
    OldestFirst,
}

pub fn validate_expense_title(title: &str) -> ApiResult<()> {
    validate_string_length(title, "Title", MAX_TITLE_LENGTH)
}

pub fn validate_expense_category(category: &str) -> ApiResult<()> {
    validate_string_length(category, "Category", MAX_CATEGORY_LENGTH)
}

pub fn extract_expense_from_row(row: libsql::Row) -> ApiResult<Expense> {
    let date: i64 = row.get(4)?;
    Ok(Expense {
        id: row.get(0)?,
        title: row.get(1)?,
        amount: row.get(2)?,
        category: row.get(3)?,
        date: timestamp_to_datetime(date)?,
        user: row.get(5)?,
    })
}

pub async fn create_expense(
    db: &Db,
    owner_id: &str,
    payload: &CreateExpensePayload,
) -> ApiResult<Expense> {
    validate_expense_title(&payload.title)?;
    validate_amount(payload.amount, "Amount")?;
    validate_expense_category(&payload.category)?;

    let expense = Expense {
        id: new_id(),
        title: payload.title.trim().to_string(),
        amount: payload.amount,
        category: payload.category.trim().to_string(),
        date: payload.date.unwrap_or_else(now_utc),
        user: owner_id.to_string(),
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO expenses (id, user_id, title, amount, category, date) VALUES (?, ?, ?, ?, ?, ?)",
        (
            expense.id.as_str(),
            owner_id,
            expense.title.as_str(),
            expense.amount,
            expense.category.as_str(),
            expense.date.unix_timestamp(),
        ),
    )
    .await?;

    Ok(expense)
}

pub async fn list_expenses(db: &Db, owner_id: &str, order: DateOrder) -> ApiResult<Vec<Expense>> {
    let query = match order {
        DateOrder::NewestFirst => {
            format!("{SELECT_EXPENSE} WHERE user_id = ? ORDER BY date DESC, rowid DESC")
        }
        DateOrder::OldestFirst => {
            format!("{SELECT_EXPENSE} WHERE user_id = ? ORDER BY date ASC, rowid ASC")
        }
    };

    let conn = db.read().await;
    let mut rows = conn.query(&query, [owner_id]).await?;

    let mut expenses = Vec::new();
    while let Some(row) = rows.next().await? {
        expenses.push(extract_expense_from_row(row)?);
    }
    Ok(expenses)
}

/// Merges the supplied fields into the caller's expense. An id owned by
/// someone else is reported exactly like a missing one.
pub async fn update_expense(
    db: &Db,
    owner_id: &str,
    expense_id: &str,
    payload: &UpdateExpensePayload,
) -> ApiResult<Expense> {
    require_any_field(&[
        payload.title.is_some(),
        payload.amount.is_some(),
        payload.category.is_some(),
        payload.date.is_some(),
    ])?;
    if let Some(title) = &payload.title {
        validate_expense_title(title)?;
    }
    if let Some(amount) = payload.amount {
        validate_amount(amount, "Amount")?;
    }
    if let Some(category) = &payload.category {
        validate_expense_category(category)?;
    }

    let conn = db.write().await;
    let mut rows = conn
        .query(
            &format!("{SELECT_EXPENSE} WHERE id = ? AND user_id = ?"),
            [expense_id, owner_id],
        )
        .await?;
    let existing = match rows.next().await? {
        Some(row) => extract_expense_from_row(row)?,
        None => return Err(ApiError::not_found(EXPENSE_NOT_FOUND)),
    };

    let updated = Expense {
        title: payload
            .title
            .as_deref()
            .map(|t| t.trim().to_string())
            .unwrap_or(existing.title),
        amount: payload.amount.unwrap_or(existing.amount),
        category: payload
            .category
            .as_deref()
            .map(|c| c.trim().to_string())
            .unwrap_or(existing.category),
        date: payload.date.unwrap_or(existing.date),
        ..existing
    };

    let affected = conn
        .execute(
            "UPDATE expenses SET title = ?, amount = ?, category = ?, date = ? WHERE id = ? AND user_id = ?",
            (
                updated.title.as_str(),
                updated.amount,
                updated.category.as_str(),
                updated.date.unix_timestamp(),
                expense_id,
                owner_id,
            ),
        )
        .await?;

    if affected == 0 {
        return Err(ApiError::not_found(EXPENSE_NOT_FOUND));
    }
    Ok(updated)
}

pub async fn remove_expense(db: &Db, owner_id: &str, expense_id: &str) -> ApiResult<()> {
    let conn = db.write().await;
    let affected = conn
        .execute(
            "DELETE FROM expenses WHERE id = ? AND user_id = ?",
            [expense_id, owner_id],
        )
        .await?;

    if affected == 0 {
        return Err(ApiError::not_found(EXPENSE_NOT_FOUND));
    }
    Ok(())
}

pub async fn post_expense(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    ValidatedJson(payload): ValidatedJson<CreateExpensePayload>,
) -> ApiResult<(StatusCode, Json<Expense>)> {
    let expense = create_expense(&state.db, &user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn get_expenses(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
) -> ApiResult<(StatusCode, Json<Vec<Expense>>)> {
    let expenses = list_expenses(&state.db, &user.id, DateOrder::NewestFirst).await?;
    Ok((StatusCode::OK, Json(expenses)))
}

pub async fn put_expense(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    Path(expense_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateExpensePayload>,
) -> ApiResult<(StatusCode, Json<Expense>)> {
    let expense = update_expense(&state.db, &user.id, &expense_id, &payload).await?;
    Ok((StatusCode::OK, Json(expense)))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    Path(expense_id): Path<String>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    remove_expense(&state.db, &user.id, &expense_id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Expense deleted successfully")),
    ))
}
