//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::detection::{DetectionService, Detector, RemoteDetector};

/// Shared application state.
///
/// Immutable after startup; requests never share anything mutable through it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    detection: DetectionService,
}

impl AppState {
    /// Create application state backed by the HTTP detector from `config`
    pub fn new(config: Config) -> Self {
        tracing::info!("Using remote detector at {}", config.detector.url);
        let detector = Arc::new(RemoteDetector::new(&config.detector.url));
        Self::with_detector(config, detector)
    }

    /// Create application state around an explicit detector
    pub fn with_detector(config: Config, detector: Arc<dyn Detector>) -> Self {
        let detection = DetectionService::new(detector, config.pipeline.longest_edge);

        Self {
            inner: Arc::new(AppStateInner { config, detection }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the detection pipeline
    pub fn detection(&self) -> &DetectionService {
        &self.inner.detection
    }
}
