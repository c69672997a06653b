use crate::error::ApiError;
use crate::identity::RequireUser;
use crate::AppState;
use api_shared::{
    Clinic, DeleteHistoryRes, ErrorRes, HistoryConditionRes, HistoryDetailRes, HistoryListRes,
    HistorySummaryRes, Specialist,
};
use axum::{
    extract::{Path as AxumPath, State},
    response::Json,
};
use cutis_core::history::{ConditionSnapshot, HistoryDetail, HistorySummary};

#[utoipa::path(
    get,
    path = "/medical-history",
    params(("x-user-id" = String, Header, description = "Signed-in user")),
    responses(
        (status = 200, description = "The caller's history, newest first", body = HistoryListRes),
        (status = 401, description = "Not signed in", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List the caller's medical history.
pub async fn list_history(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Json<HistoryListRes>, ApiError> {
    let rows = state.services.history.list(&user_id).await?;
    Ok(Json(HistoryListRes {
        history: rows.into_iter().map(summary_res).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/medical-history/{id}",
    params(
        ("id" = String, Path, description = "History entry id"),
        ("x-user-id" = String, Header, description = "Signed-in user")
    ),
    responses(
        (status = 200, description = "Entry with its condition, specialists and clinics", body = HistoryDetailRes),
        (status = 400, description = "Malformed id", body = ErrorRes),
        (status = 401, description = "Not signed in", body = ErrorRes),
        (status = 404, description = "No such entry for the caller", body = ErrorRes)
    )
)]
/// Read one medical history entry.
pub async fn get_history(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<HistoryDetailRes>, ApiError> {
    let detail = state.services.history.get(&user_id, &id).await?;
    Ok(Json(detail_res(detail)))
}

#[utoipa::path(
    delete,
    path = "/medical-history/{id}",
    params(
        ("id" = String, Path, description = "History entry id"),
        ("x-user-id" = String, Header, description = "Signed-in user")
    ),
    responses(
        (status = 200, description = "Entry and its conversations deleted", body = DeleteHistoryRes),
        (status = 400, description = "Malformed id", body = ErrorRes),
        (status = 401, description = "Not signed in", body = ErrorRes),
        (status = 404, description = "No such entry for the caller", body = ErrorRes)
    )
)]
/// Delete a medical history entry along with the caller's conversations about it.
pub async fn delete_history(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<DeleteHistoryRes>, ApiError> {
    let deleted_conversations = state.services.history.delete(&user_id, &id).await?;
    Ok(Json(DeleteHistoryRes {
        success: true,
        message: "Medical history deleted".into(),
        deleted_conversations,
    }))
}

fn condition_res(snapshot: ConditionSnapshot) -> HistoryConditionRes {
    HistoryConditionRes {
        id: snapshot.id.to_string(),
        name: snapshot.name,
        description: snapshot.description,
        severity: snapshot.severity.as_str().to_string(),
        recommendation: snapshot.recommendation,
    }
}

fn summary_res(row: HistorySummary) -> HistorySummaryRes {
    let entry = row.entry;
    HistorySummaryRes {
        id: entry.id.to_string(),
        diagnosis_date: entry.diagnosis_date.to_rfc3339(),
        upload_skin: entry.upload_skin,
        severity: entry.severity.as_str().to_string(),
        treatment_recommendation: entry.treatment_recommendation,
        condition: row.condition.map(condition_res),
    }
}

fn detail_res(detail: HistoryDetail) -> HistoryDetailRes {
    let entry = detail.entry;
    HistoryDetailRes {
        id: entry.id.to_string(),
        diagnosis_date: entry.diagnosis_date.to_rfc3339(),
        upload_skin: entry.upload_skin,
        severity: entry.severity.as_str().to_string(),
        treatment_recommendation: entry.treatment_recommendation,
        condition: detail.condition.map(condition_res),
        specialists: detail
            .specialists
            .into_iter()
            .map(|r| r.specialist)
            .collect::<Vec<Specialist>>(),
        clinics: detail
            .clinics
            .into_iter()
            .map(|r| r.clinic)
            .collect::<Vec<Clinic>>(),
        created_at: entry.created_at.to_rfc3339(),
    }
}
