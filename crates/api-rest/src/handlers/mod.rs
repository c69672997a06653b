pub mod classify;
pub mod conversations;
pub mod history;
pub mod images;

use crate::AppState;
use api_shared::{ConditionListRes, ConditionRes, HealthRes, HealthService};
use axum::{extract::State, response::Json};

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/conditions",
    responses(
        (status = 200, description = "Known skin conditions in catalog order", body = ConditionListRes)
    )
)]
/// List the condition catalog.
pub async fn list_conditions(State(state): State<AppState>) -> Json<ConditionListRes> {
    let conditions = state
        .services
        .classification
        .catalog()
        .all()
        .iter()
        .map(|c| ConditionRes {
            name: c.name.clone(),
            description: c.description.clone(),
            severity: c.severity.as_str().to_string(),
            recommendation: c.recommendation.clone(),
        })
        .collect();
    Json(ConditionListRes { conditions })
}
