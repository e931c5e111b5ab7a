//! Detection Service
//!
//! Runs one upload through resize-target calculation and a single detector call.

use std::sync::Arc;

use bytes::Bytes;

use super::{
    provider::Detector,
    types::{Detection, DetectionError, DetectionParameters, DetectionRequest},
};
use crate::resize::{self, DecodeError, TargetHeight};

/// Failure anywhere in the detection pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error("Decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result of one pipeline run
#[derive(Debug)]
pub struct PipelineOutput {
    pub target_height: TargetHeight,
    pub detection: Detection,
}

/// Detection pipeline for uploaded screenshots
#[derive(Clone)]
pub struct DetectionService {
    detector: Arc<dyn Detector>,
    longest_edge: u32,
}

impl DetectionService {
    /// Create a new detection service
    pub fn new(detector: Arc<dyn Detector>, longest_edge: u32) -> Self {
        Self {
            detector,
            longest_edge,
        }
    }

    pub fn detector(&self) -> &dyn Detector {
        self.detector.as_ref()
    }

    pub fn longest_edge(&self) -> u32 {
        self.longest_edge
    }

    /// Decode the upload, size it, and hand it to the detector once.
    ///
    /// An overlay is always requested; whether the caller uses it is up to them.
    pub async fn run(&self, image: Bytes) -> Result<PipelineOutput, PipelineError> {
        let longest_edge = self.longest_edge;

        // Full decode is CPU bound, keep it off the async workers
        let (image, target_height) = tokio::task::spawn_blocking(move || {
            let target = resize::compute_target_height(&image, longest_edge);
            (image, target)
        })
        .await?;
        let target_height = target_height?;

        tracing::debug!(
            detector = self.detector.name(),
            bytes = image.len(),
            target_height = target_height.get(),
            "Dispatching detection"
        );

        let detection = self
            .detector
            .detect(DetectionRequest {
                image,
                params: DetectionParameters::default(),
                resize_by_height: target_height,
                render: true,
            })
            .await?;

        tracing::info!(
            components = detection.components.len(),
            has_overlay = detection.overlay.is_some(),
            target_height = target_height.get(),
            "Detection complete"
        );

        Ok(PipelineOutput {
            target_height,
            detection,
        })
    }
}
