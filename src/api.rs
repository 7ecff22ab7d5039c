use crate::config::{Config, SourceKind};
use crate::llm::Summarizer;
use crate::reviews::{FixtureSource, ReviewSource};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const NO_REVIEWS: &str =
    "No reviews were found for this product. (The listing may be removed or have no reviews.)";

#[derive(Clone)]
pub struct AppState {
    pub project_name: String,
    pub reviews: Arc<dyn ReviewSource>,
    pub summarizer: Summarizer,
}

impl AppState {
    /// Wires the configured review source and model provider.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let reviews: Arc<dyn ReviewSource> = match config.source {
            SourceKind::Fixture => Arc::new(FixtureSource::new(config.fixture_delay)),
            #[cfg(feature = "headless")]
            SourceKind::Live => Arc::new(crate::reviews::LiveSource),
            #[cfg(not(feature = "headless"))]
            SourceKind::Live => anyhow::bail!("live review source is not compiled in"),
        };
        Ok(Self {
            project_name: config.project_name.clone(),
            reviews,
            summarizer: Summarizer::from_config(&config.llm)?,
        })
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/analyze_product/", post(analyze_product))
        .with_state(Arc::new(state))
}

// -------------------------------------------------------------------
// Handlers

async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("Welcome to the {} API", state.project_name),
    })
}

async fn analyze_product(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(payload) = payload.map_err(ApiError::from)?;
    info!(
        product = %payload.product_name,
        source = state.reviews.name(),
        "analysis requested"
    );

    let identifier = match state.reviews.prepare(&payload.product_asin) {
        Ok(identifier) => identifier,
        Err(rejected) => {
            info!(reason = %rejected, "identifier rejected");
            return Ok(Json(AnalyzeResponse {
                product_name: payload.product_name,
                review_count: 0,
                analysis: rejected.to_string(),
                reviews: Vec::new(),
            }));
        }
    };

    let reviews = state.reviews.fetch(&identifier).await;
    info!(count = reviews.len(), "reviews fetched");

    let analysis = if reviews.is_empty() {
        NO_REVIEWS.to_string()
    } else {
        state.summarizer.summarize(&reviews).await
    };

    Ok(Json(AnalyzeResponse {
        product_name: payload.product_name,
        review_count: reviews.len(),
        analysis,
        reviews,
    }))
}

// -------------------------------------------------------------------
// DTOs

#[derive(Serialize)]
struct RootResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(alias = "url")]
    pub product_asin: String,
    pub product_name: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalyzeResponse {
    pub product_name: String,
    pub review_count: usize,
    pub analysis: String,
    pub reviews: Vec<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self { status, code, message: message.into() }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let code = match &rejection {
            JsonRejection::JsonDataError(_) => "invalid_fields",
            JsonRejection::JsonSyntaxError(_) => "invalid_json",
            JsonRejection::MissingJsonContentType(_) => "unsupported_media_type",
            _ => "invalid_body",
        };
        Self::new(rejection.status(), code, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ErrorBody { code: self.code, message: self.message });
        (self.status, body).into_response()
    }
}
