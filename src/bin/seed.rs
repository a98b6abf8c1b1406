//! Inserts a sample user with a couple of expenses. Safe to run repeatedly.

use finance_tracker::{
    auth::{create_user, find_user_by_email},
    constants::DEFAULT_DATA_PATH,
    database::init_db,
    expenses::create_expense,
    models::{CreateExpensePayload, SignupPayload},
};

const SAMPLE_USERNAME: &str = "Rahul";
const SAMPLE_EMAIL: &str = "rahul@example.com";
const SAMPLE_PASSWORD: &str = "password123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt().init();

    let data_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());
    let db = init_db(&data_path).await?;

    if find_user_by_email(&db, SAMPLE_EMAIL).await?.is_some() {
        tracing::info!("sample user {} already exists, nothing to do", SAMPLE_EMAIL);
        return Ok(());
    }

    let user = create_user(
        &db,
        &SignupPayload {
            username: SAMPLE_USERNAME.to_string(),
            email: SAMPLE_EMAIL.to_string(),
            password: SAMPLE_PASSWORD.to_string(),
        },
    )
    .await?;

    for (title, amount, category) in [("Food", 500.0, "Groceries"), ("Petrol", 1200.0, "Transport")] {
        create_expense(
            &db,
            &user.id,
            &CreateExpensePayload {
                title: title.to_string(),
                amount,
                category: category.to_string(),
                date: None,
            },
        )
        .await?;
    }

    tracing::info!(user_id = %user.id, "sample data inserted for {}", SAMPLE_USERNAME);
    Ok(())
}
