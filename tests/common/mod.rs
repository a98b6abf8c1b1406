#![allow(dead_code)]

use axum_test::TestServer;
use finance_tracker::auth::create_user;
use finance_tracker::database::{Db, init_db};
use finance_tracker::models::{PublicUser, SignupPayload};
use finance_tracker::token::TokenService;
use finance_tracker::{AppState, build_router};
use serde_json::{Value, json};
use tempfile::{TempDir, tempdir};

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const TEST_PASSWORD: &str = "password123";

// Nov 14, 2023 22:13:20 UTC
pub const TEST_BASE_TIMESTAMP: i64 = 1700000000;

/// File-backed database in a temporary directory. Keep the `TempDir` alive
/// for as long as the database is used.
pub async fn setup_test_environment() -> (Db, TempDir) {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let data_path = temp_dir
        .path()
        .to_str()
        .expect("Failed to convert path to string")
        .to_string();

    let db = init_db(&data_path)
        .await
        .unwrap_or_else(|e| panic!("Failed to initialize database at {}: {}", data_path, e));

    (db, temp_dir)
}

pub async fn create_test_user(db: &Db, username: &str) -> PublicUser {
    create_user(
        db,
        &SignupPayload {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: TEST_PASSWORD.to_string(),
        },
    )
    .await
    .unwrap_or_else(|e| panic!("Failed to create test user '{}': {}", username, e))
}

pub fn test_server(db: Db) -> TestServer {
    let state = AppState::new(db, TokenService::new(TEST_SECRET));
    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

/// Signs a user up through the API and returns a bearer token for them.
pub async fn signup_and_login(server: &TestServer, username: &str) -> String {
    let email = format!("{}@example.com", username);

    server
        .post("/auth/signup")
        .json(&json!({ "username": username, "email": email, "password": TEST_PASSWORD }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);

    let response = server
        .post("/auth/login")
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["token"]
        .as_str()
        .expect("login response carries a token")
        .to_string()
}
