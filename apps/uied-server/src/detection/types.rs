//! Detection Types
//!
//! Defines the call contract shared by every detector backend.

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};

use crate::resize::TargetHeight;

/// Tuning knobs forwarded to the detector.
///
/// Serialized with the detector's own option names (`min-grad`, `ffl-block`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DetectionParameters {
    /// Gradient threshold used to produce the binary map
    pub min_grad: u32,
    /// Flood-fill block threshold
    pub ffl_block: u32,
    /// Minimum pixel area for a retained element
    pub min_ele_area: u32,
    /// Merge elements fully contained in others
    pub merge_contained_ele: bool,
    /// Merge text lines into paragraphs
    pub merge_line_to_paragraph: bool,
    /// Discard bar-shaped artifacts
    pub remove_bar: bool,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        Self {
            min_grad: 25,
            ffl_block: 5,
            min_ele_area: 50,
            merge_contained_ele: false,
            merge_line_to_paragraph: false,
            remove_bar: false,
        }
    }
}

/// A single detected UI component.
///
/// The record is owned by the detector; it is carried through untouched and
/// re-serialized exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementCompo(serde_json::Value);

impl ElementCompo {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Everything a detector needs for one upload
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    /// Raw upload bytes, as received
    pub image: Bytes,
    pub params: DetectionParameters,
    /// Analysis height the detector resizes to
    pub resize_by_height: TargetHeight,
    /// Ask for an annotated overlay alongside the components
    pub render: bool,
}

/// Input annotated with component boundaries
#[derive(Debug, Clone)]
pub enum Overlay {
    /// Already JPEG; sent to clients byte for byte
    Jpeg(Vec<u8>),
    /// Pixels that still need encoding
    Image(DynamicImage),
}

impl Overlay {
    /// Validate an encoded overlay, keeping JPEG payloads as they are
    pub fn from_encoded(bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(&bytes)?;

        if image::guess_format(&bytes).ok() == Some(ImageFormat::Jpeg) {
            Ok(Overlay::Jpeg(bytes))
        } else {
            Ok(Overlay::Image(decoded))
        }
    }
}

/// Detector output
#[derive(Debug, Clone, Default)]
pub struct Detection {
    pub components: Vec<ElementCompo>,
    /// Present only when rendering was requested and the detector produced one
    pub overlay: Option<Overlay>,
}

/// Detection error types
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("Detector API error: {0}")]
    ApiError(String),

    #[error("Invalid detector response: {0}")]
    InvalidResponse(String),

    /// The detector ran and reported a failure of its own
    #[error("Detection failed: {0}")]
    ProcessingError(String),
}
