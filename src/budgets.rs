use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use libsql::Connection;

use crate::AppState;
use crate::constants::MAX_CATEGORY_LENGTH;
use crate::database::Db;
use crate::error::{ApiError, ApiResult, ValidatedJson};
use crate::models::{Budget, CreateBudgetPayload, MessageResponse, PublicUser, UpdateBudgetPayload};
use crate::utils::{new_id, require_any_field, validate_amount, validate_string_length};

const BUDGET_NOT_FOUND: &str = "Budget not found";
const BUDGET_EXISTS: &str = "A budget for this category already exists";

pub fn validate_budget_category(category: &str) -> ApiResult<()> {
    validate_string_length(category, "Category", MAX_CATEGORY_LENGTH)
}

pub fn extract_budget_from_row(row: libsql::Row) -> ApiResult<Budget> {
    Ok(Budget {
        id: row.get(0)?,
        category: row.get(1)?,
        amount: row.get(2)?,
        user: row.get(3)?,
    })
}

// One budget per category and owner, compared case-insensitively.
async fn ensure_category_free(
    conn: &Connection,
    owner_id: &str,
    category: &str,
    except_id: Option<&str>,
) -> ApiResult<()> {
    let mut rows = conn
        .query(
            "SELECT id FROM budgets WHERE user_id = ? AND LOWER(category) = LOWER(?) AND id != ?",
            [owner_id, category, except_id.unwrap_or("")],
        )
        .await?;

    if rows.next().await?.is_some() {
        return Err(ApiError::conflict(BUDGET_EXISTS));
    }
    Ok(())
}

pub async fn create_budget(
    db: &Db,
    owner_id: &str,
    payload: &CreateBudgetPayload,
) -> ApiResult<Budget> {
    validate_budget_category(&payload.category)?;
    validate_amount(payload.amount, "Amount")?;

    let budget = Budget {
        id: new_id(),
        category: payload.category.trim().to_string(),
        amount: payload.amount,
        user: owner_id.to_string(),
    };

    let conn = db.write().await;
    ensure_category_free(&conn, owner_id, &budget.category, None).await?;

    conn.execute(
        "INSERT INTO budgets (id, user_id, category, amount) VALUES (?, ?, ?, ?)",
        (
            budget.id.as_str(),
            owner_id,
            budget.category.as_str(),
            budget.amount,
        ),
    )
    .await?;

    Ok(budget)
}

pub async fn list_budgets(db: &Db, owner_id: &str) -> ApiResult<Vec<Budget>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, category, amount, user_id FROM budgets WHERE user_id = ?",
            [owner_id],
        )
        .await?;

    let mut budgets = Vec::new();
    while let Some(row) = rows.next().await? {
        budgets.push(extract_budget_from_row(row)?);
    }
    Ok(budgets)
}

pub async fn update_budget(
    db: &Db,
    owner_id: &str,
    budget_id: &str,
    payload: &UpdateBudgetPayload,
) -> ApiResult<Budget> {
    require_any_field(&[payload.category.is_some(), payload.amount.is_some()])?;
    if let Some(category) = &payload.category {
        validate_budget_category(category)?;
    }
    if let Some(amount) = payload.amount {
        validate_amount(amount, "Amount")?;
    }

    let conn = db.write().await;
    let mut rows = conn
        .query(
            "SELECT id, category, amount, user_id FROM budgets WHERE id = ? AND user_id = ?",
            [budget_id, owner_id],
        )
        .await?;
    let existing = match rows.next().await? {
        Some(row) => extract_budget_from_row(row)?,
        None => return Err(ApiError::not_found(BUDGET_NOT_FOUND)),
    };

    let updated = Budget {
        category: payload
            .category
            .as_deref()
            .map(|c| c.trim().to_string())
            .unwrap_or(existing.category),
        amount: payload.amount.unwrap_or(existing.amount),
        ..existing
    };

    if payload.category.is_some() {
        ensure_category_free(&conn, owner_id, &updated.category, Some(budget_id)).await?;
    }

    let affected = conn
        .execute(
            "UPDATE budgets SET category = ?, amount = ? WHERE id = ? AND user_id = ?",
            (
                updated.category.as_str(),
                updated.amount,
                budget_id,
                owner_id,
            ),
        )
        .await?;

    if affected == 0 {
        return Err(ApiError::not_found(BUDGET_NOT_FOUND));
    }
    Ok(updated)
}

pub async fn remove_budget(db: &Db, owner_id: &str, budget_id: &str) -> ApiResult<()> {
    let conn = db.write().await;
    let affected = conn
        .execute(
            "DELETE FROM budgets WHERE id = ? AND user_id = ?",
            [budget_id, owner_id],
        )
        .await?;

    if affected == 0 {
        return Err(ApiError::not_found(BUDGET_NOT_FOUND));
    }
    Ok(())
}

pub async fn post_budget(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    ValidatedJson(payload): ValidatedJson<CreateBudgetPayload>,
) -> ApiResult<(StatusCode, Json<Budget>)> {
    let budget = create_budget(&state.db, &user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

pub async fn get_budgets(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
) -> ApiResult<(StatusCode, Json<Vec<Budget>>)> {
    let budgets = list_budgets(&state.db, &user.id).await?;
    Ok((StatusCode::OK, Json(budgets)))
}

pub async fn put_budget(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    Path(budget_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateBudgetPayload>,
) -> ApiResult<(StatusCode, Json<Budget>)> {
    let budget = update_budget(&state.db, &user.id, &budget_id, &payload).await?;
    Ok((StatusCode::OK, Json(budget)))
}

pub async fn delete_budget(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    Path(budget_id): Path<String>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    remove_budget(&state.db, &user.id, &budget_id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Budget deleted successfully")),
    ))
}
