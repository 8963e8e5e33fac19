/*
 * Responsibility
 * - tracing 初期化 → Config 読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (CORS / HTTP 共通 / Bearer)
 * - axum::serve() で起動
 */
use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use crate::{
    api,
    config::Config,
    middleware,
    services::auth::build_token_verifier,
    state::AppState,
};

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing();

    // Only connect when users are resolved from the database.
    let db = match (&config.database_url, config.keycloak.load_user_from_database) {
        (Some(url), true) => Some(
            PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?,
        ),
        _ => None,
    };

    let verifier = build_token_verifier(&config.keycloak, db)?;
    let state = AppState::new(verifier);

    let app = build_router(state);
    let app = middleware::cors::apply(app, &config);
    let app = middleware::http::apply(app);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, env = ?config.app_env, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Routes + auth middleware, without the transport-level layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
