use server::config;
use server::db;
use server::notify::Notifier;
use server::routes;

use axum::{routing::{get, post}, Extension, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env();

    tracing::info!("Connecting to database...");
    let pool = db::pool::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running migrations...");
    db::pool::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    match db::sessions::purge_expired(&pool).await {
        Ok(0) => {}
        Ok(n) => tracing::info!("Purged {} expired sessions", n),
        Err(e) => tracing::warn!("Failed to purge expired sessions: {}", e),
    }

    let notifier = Notifier::new(config.events_capacity);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        // Health
        .route("/health", get(routes::health::health_check))
        // Auth
        .route("/api/auth/join", post(routes::auth::join))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        // Lobby
        .route("/api/users/online", get(routes::presence::online_users))
        .route("/api/challenges", post(routes::challenges::create_challenge))
        .route("/api/challenges/pending", get(routes::challenges::check_for_challenges))
        // Matches — specific routes before parameterized
        .route("/api/matches", get(routes::matches::history))
        .route("/api/matches/current", get(routes::matches::current_match))
        .route("/api/matches/{match_id}", get(routes::matches::get_match_state))
        .route("/api/matches/{match_id}/move", post(routes::matches::submit_move))
        .route("/api/matches/{match_id}/resign", post(routes::matches::resign))
        .route("/api/matches/{match_id}/hide", post(routes::matches::hide_match))
        .route(
            "/api/matches/{match_id}/journal",
            get(routes::journal::get_journal)
                .put(routes::journal::edit_journal)
                .delete(routes::journal::delete_journal),
        )
        // Push channel
        .route("/api/events", get(routes::events::ws_handler))
        // Shared state
        .layer(Extension(pool))
        .layer(Extension(config.clone()))
        .layer(Extension(notifier))
        .layer(cors);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
