//! Personal finance tracker API.
//!
//! Users sign up and log in for a bearer token; every financial resource
//! (expenses, budgets, saving goals, reminders) sits behind [`auth::require_auth`]
//! and is only ever visible to the user that owns it.

use std::sync::Arc;

use axum::{
    Json, Router, middleware,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod budgets;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod export;
pub mod expenses;
pub mod models;
pub mod reminders;
pub mod saving_goals;
pub mod summary;
pub mod token;
pub mod utils;

use database::Db;
use token::TokenService;

/// Shared handler state: the store and the configured token service.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(db: Db, tokens: TokenService) -> Self {
        AppState {
            db,
            tokens: Arc::new(tokens),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/auth/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route("/users/profile", get(auth::get_profile))
        .route(
            "/expenses",
            get(expenses::get_expenses).post(expenses::post_expense),
        )
        .route("/expenses/export-csv", get(export::export_csv))
        .route(
            "/expenses/{id}",
            put(expenses::put_expense).delete(expenses::delete_expense),
        )
        .route(
            "/budgets",
            get(budgets::get_budgets).post(budgets::post_budget),
        )
        .route(
            "/budgets/{id}",
            put(budgets::put_budget).delete(budgets::delete_budget),
        )
        .route(
            "/saving-goals",
            get(saving_goals::get_saving_goals).post(saving_goals::post_saving_goal),
        )
        .route(
            "/saving-goals/{id}",
            put(saving_goals::put_saving_goal).delete(saving_goals::delete_saving_goal),
        )
        .route(
            "/reminders",
            get(reminders::get_reminders).post(reminders::post_reminder),
        )
        .route(
            "/reminders/{id}",
            put(reminders::put_reminder).delete(reminders::delete_reminder),
        )
        .route("/summary", get(summary::get_summary))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/", get(root))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
