mod api;
mod config;
mod llm;
mod reviews;

use dotenv::dotenv;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use axum::http::Method;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    dotenv().ok();

    let config = config::Config::from_env().context("invalid configuration")?;
    let state = api::AppState::from_config(&config)?;
    tracing::info!(
        source = state.reviews.name(),
        provider = ?config.llm.provider,
        model_available = state.summarizer.is_available(),
        "{} starting",
        config.project_name
    );

    // API router
    let api_router = api::routes(state);

    // Browser UI under /ui with index fallback
    let index = format!("{}/index.html", config.public_dir);
    let static_service = ServeDir::new(&config.public_dir).not_found_service(ServeFile::new(index));
    // CORS (dev use: allow any origin)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let app = axum::Router::new()
        .merge(api_router)
        .nest_service("/ui", static_service)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Bind
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid HOST/PORT")?;
    tracing::info!("listening on http://{}", addr);
    tracing::info!("UI available at http://{}/ui/", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    const INDEX: &str = include_str!("../public/index.html");

    #[test]
    fn ui_sanitizes_rendered_analysis() {
        assert!(INDEX.contains("purify.min.js"));
        assert!(INDEX.contains("DOMPurify.sanitize(marked.parse(text))"));
        assert!(INDEX.contains("analysis.innerHTML = renderMarkdown(data.analysis);"));
        assert!(!INDEX.contains("innerHTML = window.marked ? marked.parse"));
    }
}
