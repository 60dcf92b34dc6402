use anyhow::Context;

mod app;
mod config;
mod diary;
mod nutrition;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "materna=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;

    // The diary must not come up without its schema; a failed migration is
    // fatal rather than a warning.
    sqlx::migrate!("./migrations")
        .run(&app_state.db)
        .await
        .context("run database migrations")?;

    let week = app_state.profile.current_week();
    let trimester = app_state.profile.current_trimester();
    tracing::info!(week, trimester = trimester.number(), "profile loaded");

    let app = app::build_app(app_state);
    app::serve(app).await
}
