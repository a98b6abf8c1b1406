use tracing_subscriber::EnvFilter;

use finance_tracker::{
    AppState, build_router, config::Config, database::init_db, token::TokenService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("finance_tracker=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let db = init_db(&config.data_path).await?;
    tracing::info!(data_path = %config.data_path, "database ready");

    let state = AppState::new(db, TokenService::new(&config.jwt_secret));
    let app = build_router(state);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server running on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
