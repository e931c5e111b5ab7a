//! Detection endpoints
//!
//! - POST /infer - detect UI components, respond with a JSON array
//! - POST /render - detect UI components, respond with the annotated overlay
//!
//! Both take a multipart upload with the image in the `image` file field.
//! Success responses carry the upload's declared content type.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    response::Response,
    routing::post,
    Router,
};

use crate::error::{ApiError, Result};
use crate::response;
use crate::state::AppState;

/// Multipart field holding the upload
const IMAGE_FIELD: &str = "image";

/// Create the detection router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/infer", post(infer))
        .route("/render", post(render))
}

/// Image pulled out of a request; dropped with the request on every path
struct UploadedImage {
    data: Bytes,
    content_type: Option<String>,
}

/// Find the `image` file part. A body that is not multipart at all, one with
/// no parseable part, or a form without a named file in that field, counts as
/// no upload. Stream errors once a part has been read are real failures.
async fn read_upload(multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<UploadedImage> {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::warn!("Rejected non-multipart upload: {}", rejection);
            return Err(ApiError::MissingUpload);
        }
    };

    let mut seen_part = false;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if !seen_part => {
                tracing::warn!("Multipart body has no readable part: {}", e);
                return Err(ApiError::MissingUpload);
            }
            Err(e) => return Err(e.into()),
        };
        seen_part = true;

        let is_file = field.file_name().is_some_and(|name| !name.is_empty());
        if field.name() != Some(IMAGE_FIELD) || !is_file {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;

        tracing::debug!(
            bytes = data.len(),
            content_type = ?content_type,
            "Received image upload"
        );

        return Ok(UploadedImage { data, content_type });
    }

    tracing::warn!("No image field found in multipart upload");
    Err(ApiError::MissingUpload)
}

/// POST /infer
async fn infer(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let UploadedImage { data, content_type } = read_upload(multipart).await?;

    let output = state.detection().run(data).await?;
    let body = response::encode_components(&output.detection.components)?;

    Ok(response::respond(body, content_type.as_deref())?)
}

/// POST /render
async fn render(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    let UploadedImage { data, content_type } = read_upload(multipart).await?;

    let output = state.detection().run(data).await?;
    let body = match response::encode_overlay(output.detection.overlay)? {
        Some(jpeg) => jpeg,
        None => {
            tracing::debug!("Detector produced no overlay, returning empty body");
            Vec::new()
        }
    };

    Ok(response::respond(body, content_type.as_deref())?)
}
