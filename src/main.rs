// src/main.rs

use std::time::Duration;

use dotenvy::dotenv;
use quizplan::config::Config;
use quizplan::error::AppError;
use quizplan::models::question::CreateQuestionRequest;
use quizplan::routes;
use quizplan::state::AppState;
use quizplan::store::{QuestionBank, SqliteStore, sqlite};
use sqlx::SqlitePool;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use validator::Validate;

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if let Err(e) = run(config).await {
        tracing::error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), AppError> {
    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match sqlite::connect(&config.database_url).await {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    return Err(AppError::InternalServerError(format!(
                        "Failed to connect to database after 5 retries: {}",
                        e
                    )));
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlite::migrate(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    // Seed Question Bank
    if let Some(path) = config.seed_questions_path.as_deref() {
        if let Err(e) = seed_questions(&pool, path).await {
            tracing::error!("Failed to seed questions from {}: {}", path, e);
        }
    }

    let state = AppState {
        store: SqliteStore::new(pool),
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| AppError::InternalServerError(format!("bind {}: {}", config.bind_addr, e)))?;
    tracing::info!("Listening on {}", config.bind_addr);

    // Start the server
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Loads a JSON array of questions into an empty bank. A populated bank is
/// left untouched.
async fn seed_questions(pool: &SqlitePool, path: &str) -> Result<(), AppError> {
    let store = SqliteStore::new(pool.clone());
    if !store.list_subjects().await?.is_empty() {
        tracing::info!("Question bank already populated, skipping seed.");
        return Ok(());
    }

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    let entries: Vec<CreateQuestionRequest> = serde_json::from_str(&raw)?;

    let mut questions = Vec::with_capacity(entries.len());
    for entry in entries {
        entry.validate()?;
        questions.push(entry.into_question());
    }

    let inserted = store.insert_questions(&questions).await?;
    tracing::info!("Seeded {} questions from {}", inserted, path);
    Ok(())
}
