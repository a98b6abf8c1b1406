use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::utils::{deserialize_date, deserialize_optional_date};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// A user as seen by clients and by handlers behind the auth gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupPayload {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfilePayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

// Expenses

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: String,
    pub title: String,
    pub amount: f64,
    pub category: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExpensePayload {
    pub title: String,
    pub amount: f64,
    pub category: String,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateExpensePayload {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date: Option<OffsetDateTime>,
}

// Budgets

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub id: String,
    pub category: String,
    pub amount: f64,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBudgetPayload {
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBudgetPayload {
    pub category: Option<String>,
    pub amount: Option<f64>,
}

// Saving goals

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavingGoal {
    pub id: String,
    pub title: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub user: String,
}

impl SavingGoal {
    /// `current / target` as a percentage; a zero target counts as no progress.
    pub fn progress_percent(&self) -> f64 {
        if self.target_amount <= 0.0 {
            return 0.0;
        }
        self.current_amount / self.target_amount * 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSavingGoalPayload {
    pub title: String,
    pub target_amount: f64,
    #[serde(default)]
    pub current_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSavingGoalPayload {
    pub title: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
}

// Reminders

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub due_date: OffsetDateTime,
    pub is_completed: bool,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminderPayload {
    pub title: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub due_date: OffsetDateTime,
    #[serde(default)]
    pub is_completed: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReminderPayload {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub due_date: Option<OffsetDateTime>,
    pub is_completed: Option<bool>,
}

// Dashboard summary

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpending {
    pub category: String,
    pub spent: f64,
    pub budget: Option<f64>,
    pub percent_used: f64,
    pub over_budget: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub id: String,
    pub title: String,
    pub progress_percent: f64,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_spent: f64,
    pub category_count: usize,
    pub top_category: Option<String>,
    pub categories: Vec<CategorySpending>,
    pub saving_goals: Vec<GoalProgress>,
    pub upcoming_reminders: usize,
}
