//! # API REST
//!
//! REST API implementation for Cutis.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (multipart parsing, identity headers, status codes, CORS)
//!
//! Business logic lives in `cutis-core`; wire types come from `api-shared`.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;
pub mod identity;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use cutis_core::Services;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Largest accepted `/classify` request body
    pub max_upload_bytes: usize,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_conditions,
        handlers::classify::classify_image,
        handlers::images::get_image,
        handlers::history::list_history,
        handlers::history::get_history,
        handlers::history::delete_history,
        handlers::conversations::start_conversation,
        handlers::conversations::reply_conversation,
        handlers::conversations::latest_conversation,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorRes,
        api_shared::FailureRes,
        api_shared::ClassifyForm,
        api_shared::ClassifyRes,
        api_shared::ConditionSummary,
        api_shared::Specialist,
        api_shared::Clinic,
        api_shared::ConditionRes,
        api_shared::ConditionListRes,
        api_shared::HistoryConditionRes,
        api_shared::HistorySummaryRes,
        api_shared::HistoryListRes,
        api_shared::HistoryDetailRes,
        api_shared::DeleteHistoryRes,
        api_shared::StartConversationReq,
        api_shared::StartConversationRes,
        api_shared::ReplyConversationReq,
        api_shared::ReplyConversationRes,
        api_shared::ChatMessageRes,
        api_shared::ConversationRes,
        api_shared::LatestConversationRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full router, including Swagger UI at `/swagger-ui`.
pub fn build_router(state: AppState) -> Router {
    let classify = Router::new()
        .route("/classify", post(handlers::classify::classify_image))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/conditions", get(handlers::list_conditions))
        .route("/images/*id", get(handlers::images::get_image))
        .route("/medical-history", get(handlers::history::list_history))
        .route(
            "/medical-history/:id",
            get(handlers::history::get_history).delete(handlers::history::delete_history),
        )
        .route(
            "/conversations",
            post(handlers::conversations::start_conversation),
        )
        .route(
            "/conversations/latest",
            get(handlers::conversations::latest_conversation),
        )
        .route(
            "/conversations/:id/reply",
            post(handlers::conversations::reply_conversation),
        )
        .merge(classify)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
