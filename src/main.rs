use std::sync::Arc;

use clap::Parser;
use trivia_forge::backend::GeminiBackend;
use trivia_forge::config::{Args, ServiceConfig};
use trivia_forge::fetch::QuestionFetcher;
use trivia_forge::pool::QuestionPool;
use trivia_forge::server::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "trivia_forge=debug,tower_http=info,axum=info".to_owned());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServiceConfig::from_args(Args::parse())?;

    let mut fetcher = QuestionFetcher::builder(Arc::new(GeminiBackend::new(config.api_key.clone())))
        .base_url(config.base_url.clone())
        .config(config.fetch.clone());
    if config.use_pool {
        fetcher = fetcher.pool(QuestionPool::new());
    }

    let app = router(AppState {
        fetcher: Arc::new(fetcher.build()),
        max_questions: config.max_questions,
    });

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(
        address = %config.bind,
        model = %config.fetch.model,
        policy = %config.fetch.validator.policy,
        wire_shape = %config.fetch.wire_shape,
        pool = config.use_pool,
        "trivia service listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
