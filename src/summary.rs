use std::collections::HashMap;

use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::AppState;
use crate::budgets::list_budgets;
use crate::error::ApiResult;
use crate::expenses::{DateOrder, list_expenses};
use crate::models::{
    Budget, CategorySpending, Expense, GoalProgress, PublicUser, Reminder, SavingGoal, Summary,
};
use crate::reminders::list_reminders;
use crate::saving_goals::list_saving_goals;

/// Totals spending per expense category and compares it against the budget
/// whose category matches case-insensitively.
pub fn category_spending(expenses: &[Expense], budgets: &[Budget]) -> Vec<CategorySpending> {
    let mut totals: Vec<(String, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for expense in expenses {
        match index.get(expense.category.as_str()) {
            Some(&position) => totals[position].1 += expense.amount,
            None => {
                index.insert(expense.category.as_str(), totals.len());
                totals.push((expense.category.clone(), expense.amount));
            }
        }
    }

    let mut spending: Vec<CategorySpending> = totals
        .into_iter()
        .map(|(category, spent)| {
            let budget = budgets
                .iter()
                .find(|b| b.category.to_lowercase() == category.to_lowercase())
                .map(|b| b.amount);
            let percent_used = match budget {
                Some(limit) if limit > 0.0 => (spent / limit * 100.0).min(100.0),
                _ => 0.0,
            };
            CategorySpending {
                over_budget: spent > budget.unwrap_or(0.0),
                category,
                spent,
                budget,
                percent_used,
            }
        })
        .collect();

    spending.sort_by(|a, b| b.spent.total_cmp(&a.spent));
    spending
}

pub fn goal_progress(goals: &[SavingGoal]) -> Vec<GoalProgress> {
    goals
        .iter()
        .map(|goal| {
            let progress_percent = goal.progress_percent();
            GoalProgress {
                id: goal.id.clone(),
                title: goal.title.clone(),
                progress_percent,
                completed: progress_percent >= 100.0,
            }
        })
        .collect()
}

pub fn build_summary(
    expenses: &[Expense],
    budgets: &[Budget],
    goals: &[SavingGoal],
    reminders: &[Reminder],
) -> Summary {
    let categories = category_spending(expenses, budgets);

    Summary {
        total_spent: expenses.iter().map(|e| e.amount).sum(),
        category_count: categories.len(),
        top_category: categories.first().map(|c| c.category.clone()),
        categories,
        saving_goals: goal_progress(goals),
        upcoming_reminders: reminders.iter().filter(|r| !r.is_completed).count(),
    }
}

pub async fn get_summary(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
) -> ApiResult<(StatusCode, Json<Summary>)> {
    let expenses = list_expenses(&state.db, &user.id, DateOrder::NewestFirst).await?;
    let budgets = list_budgets(&state.db, &user.id).await?;
    let goals = list_saving_goals(&state.db, &user.id).await?;
    let reminders = list_reminders(&state.db, &user.id).await?;

    Ok((
        StatusCode::OK,
        Json(build_summary(&expenses, &budgets, &goals, &reminders)),
    ))
}
