//! Response encoding
//!
//! Turns detector output into HTTP bodies: components as a JSON array, the
//! overlay as JPEG bytes.

use std::io::Cursor;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use image::{DynamicImage, ImageFormat};

use crate::detection::{ElementCompo, Overlay};

/// Content type used when the upload did not declare one
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Failed to serialize components: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to encode overlay: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid content type: {0:?}")]
    InvalidContentType(String),
}

/// Serialize the component collection as a JSON array, records untouched
pub fn encode_components(components: &[ElementCompo]) -> Result<Vec<u8>, EncodeError> {
    Ok(serde_json::to_vec(components)?)
}

/// Encode the overlay as JPEG. `None` in, `None` out.
///
/// Overlays the detector already sent as JPEG go out unchanged.
pub fn encode_overlay(overlay: Option<Overlay>) -> Result<Option<Vec<u8>>, EncodeError> {
    let overlay = match overlay {
        None => return Ok(None),
        Some(Overlay::Jpeg(bytes)) => return Ok(Some(bytes)),
        Some(Overlay::Image(image)) => image,
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(overlay.to_rgb8());

    let mut buffer = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)?;
    Ok(Some(buffer))
}

/// Build a 200 response carrying `body` under the upload's declared type.
///
/// The header echoes the upload even when it does not describe the body
/// (a PNG upload to `/infer` gets JSON labelled `image/png`). Existing
/// clients depend on this.
pub fn respond(body: Vec<u8>, declared_type: Option<&str>) -> Result<Response, EncodeError> {
    let declared = declared_type.unwrap_or(FALLBACK_CONTENT_TYPE);
    let content_type = HeaderValue::from_str(declared)
        .map_err(|_| EncodeError::InvalidContentType(declared.to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        Body::from(body),
    )
        .into_response())
}
