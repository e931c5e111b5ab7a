//! Resize target calculation
//!
//! Works out the analysis height handed to the detector so that the
//! longer edge of an upload lands on a fixed length.

use serde::Serialize;

/// Failure to turn upload bytes into a pixel grid
#[derive(Debug, thiserror::Error)]
#[error("Failed to decode image: {0}")]
pub struct DecodeError(#[from] image::ImageError);

/// Height, in pixels, the detector should resize the upload to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TargetHeight(u32);

impl TargetHeight {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Decode `raw` and compute the target height for `longest_edge`.
///
/// The whole image is decoded, not just its header, so truncated or
/// corrupt payloads fail here rather than inside the detector.
pub fn compute_target_height(raw: &[u8], longest_edge: u32) -> Result<TargetHeight, DecodeError> {
    let img = image::load_from_memory(raw)?;
    Ok(target_height_for(img.width(), img.height(), longest_edge))
}

/// Portrait uploads keep `longest_edge`; anything else is scaled by
/// height/width and floored. Square images land on `longest_edge` either way.
pub fn target_height_for(width: u32, height: u32, longest_edge: u32) -> TargetHeight {
    if height > width {
        return TargetHeight(longest_edge);
    }

    // width >= height > 0 here, so the quotient never exceeds longest_edge
    let scaled = u64::from(longest_edge) * u64::from(height) / u64::from(width.max(1));
    TargetHeight((scaled as u32).max(1))
}
