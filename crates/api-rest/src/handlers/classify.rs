use crate::identity::UserIdentity;
use crate::AppState;
use api_shared::{ClassifyForm, ClassifyRes, ErrorRes, FailureRes};
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use cutis_core::{ClassifyFailure, ClassifyRequest, ImageUpload};

const IMAGE_FIELD: &str = "image";
const LOCATION_FIELD: &str = "location";
const DEFAULT_FILENAME: &str = "image";

#[utoipa::path(
    post,
    path = "/classify",
    request_body(content = ClassifyForm, content_type = "multipart/form-data"),
    params(
        ("x-user-id" = Option<String>, Header, description = "Signed-in user; omit for guests")
    ),
    responses(
        (status = 200, description = "Classification result", body = ClassifyRes),
        (status = 400, description = "No image, unsupported image or classifier failure", body = FailureRes),
        (status = 401, description = "Malformed user identity", body = ErrorRes),
        (status = 500, description = "Unexpected error", body = ErrorRes)
    )
)]
/// Classify an uploaded skin photo
///
/// Guests receive the same result as signed-in users; only signed-in users get a medical
/// history entry.
pub async fn classify_image(
    State(state): State<AppState>,
    UserIdentity(user_id): UserIdentity,
    multipart: Multipart,
) -> Response {
    let (image, location) = match read_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let request = ClassifyRequest {
        image,
        location,
        user_id,
    };

    match state.services.classification.classify(request).await {
        Ok(success) => (StatusCode::OK, Json(success.into_body())).into_response(),
        Err(failure) => failure_response(failure),
    }
}

async fn read_form(
    mut multipart: Multipart,
) -> Result<(Option<ImageUpload>, Option<String>), Response> {
    let mut image = None;
    let mut location = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read multipart body");
                return Err((e.status(), Json(FailureRes::new(e.body_text()))).into_response());
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            IMAGE_FIELD => {
                let filename = field
                    .file_name()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(DEFAULT_FILENAME)
                    .to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    tracing::warn!(error = %e, "failed to read uploaded image");
                    (e.status(), Json(FailureRes::new(e.body_text()))).into_response()
                })?;
                if !bytes.is_empty() {
                    image = Some(ImageUpload {
                        filename,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            LOCATION_FIELD => {
                let text = field.text().await.map_err(|e| {
                    tracing::warn!(error = %e, "failed to read location field");
                    (e.status(), Json(FailureRes::new(e.body_text()))).into_response()
                })?;
                let text = text.trim();
                if !text.is_empty() {
                    location = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    Ok((image, location))
}

fn failure_response(failure: ClassifyFailure) -> Response {
    if failure.is_client_error() {
        (
            StatusCode::BAD_REQUEST,
            Json(FailureRes::new(failure.message())),
        )
            .into_response()
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorRes {
                message: failure.message(),
            }),
        )
            .into_response()
    }
}
