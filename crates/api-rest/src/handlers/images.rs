use crate::error::ApiError;
use crate::AppState;
use api_shared::ErrorRes;
use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use cutis_files::{FilesError, ImageId};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SignedUrlQuery {
    /// Unix time after which the URL stops working
    pub expires: Option<i64>,
    /// Hex signature issued with the URL
    pub sig: Option<String>,
}

#[utoipa::path(
    get,
    path = "/images/{id}",
    params(
        ("id" = String, Path, description = "Image id, e.g. Skins/Acne/1717171717171-photo.jpg"),
        SignedUrlQuery
    ),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/*"),
        (status = 403, description = "Missing, invalid or expired signature", body = ErrorRes),
        (status = 404, description = "No such image", body = ErrorRes)
    )
)]
/// Serve a stored image through its signed URL.
pub async fn get_image(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Query(query): Query<SignedUrlQuery>,
) -> Result<Response, ApiError> {
    let id = id.trim_start_matches('/');
    let (Some(expires), Some(sig)) = (query.expires, query.sig.as_deref()) else {
        return Err(ApiError::new(StatusCode::FORBIDDEN, "Signed URL required"));
    };

    state
        .services
        .images
        .signer()
        .verify(id, expires, sig, state.services.clock.now())
        .map_err(|e| ApiError::new(StatusCode::FORBIDDEN, e.to_string()))?;

    let id = ImageId::parse(id).map_err(|_| not_found())?;
    let images = state.services.images.clone();
    let (bytes, media_type) = tokio::task::spawn_blocking(move || {
        let bytes = images.read(&id)?;
        let media_type = images.media_type(&id)?;
        Ok::<_, FilesError>((bytes, media_type))
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "image read task failed");
        ApiError::internal()
    })?
    .map_err(|e| match e {
        FilesError::NotFound(_) => not_found(),
        other => {
            tracing::error!(error = %other, "failed to read image");
            ApiError::internal()
        }
    })?;

    Ok(([(header::CONTENT_TYPE, media_type)], bytes).into_response())
}

fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "Image not found")
}
