//! Image upload and deletion routes.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, post},
};
use inkpot_core::storage::{GatewayError, UploadRequest};
use inkpot_shared::AppError;
use serde::Serialize;
use tracing::{error, warn};

use crate::AppState;
use crate::error::error_response;

/// Multipart field carrying the image file.
pub const IMAGE_FIELD: &str = "image";

/// Creates the image routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/images", post(upload_image))
        .route("/images/{key}", delete(delete_image))
}

/// Response for a stored image.
#[derive(Debug, Serialize)]
pub struct UploadImageResponse {
    /// Public URL of the image.
    pub url: String,
    /// Storage key, used to delete the image later.
    pub key: String,
}

/// POST `/images`
/// Upload the `image` file of a multipart form.
async fn upload_image(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let (file_name, data) = match read_image_field(&mut multipart).await {
        Ok(field) => field,
        Err(e) => {
            warn!(error = %e, "Rejected upload form");
            return error_response(&e);
        }
    };

    match state
        .gateway
        .upload(UploadRequest::from_bytes(file_name, data))
        .await
    {
        Ok(image) => (
            StatusCode::CREATED,
            Json(UploadImageResponse {
                url: image.url,
                key: image.key,
            }),
        )
            .into_response(),
        Err(e) => {
            log_failure(&e, "Image upload");
            error_response(&AppError::from(e))
        }
    }
}

/// DELETE `/images/{key}`
async fn delete_image(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.gateway.delete(&key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            log_failure(&e, "Image delete");
            error_response(&AppError::from(e))
        }
    }
}

/// Find the image field and read its file name and content.
async fn read_image_field(multipart: &mut Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| {
                AppError::Validation(format!("'{IMAGE_FIELD}' field has no file name"))
            })?;
        let data = field.bytes().await.map_err(multipart_error)?;
        return Ok((file_name, data));
    }

    Err(AppError::Validation(format!("missing '{IMAGE_FIELD}' file field")))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::Validation(err.body_text())
    }
}

fn log_failure(err: &GatewayError, action: &str) {
    match err {
        GatewayError::Validation(_) => warn!(error = %err, "{action} rejected"),
        GatewayError::Io(_) | GatewayError::Store(_) => error!(error = %err, "{action} failed"),
    }
}
