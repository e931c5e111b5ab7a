//! Detection Module
//!
//! Boundary to the external UI element detector.
//!
//! The detector itself lives outside this crate; this module only defines the
//! call contract, a client for the HTTP-hosted detector, and the pipeline that
//! sizes an upload before handing it over.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use uied_server::detection::{DetectionService, RemoteDetector};
//!
//! let detector = Arc::new(RemoteDetector::new("http://localhost:8500"));
//! let service = DetectionService::new(detector, 1366);
//!
//! let output = service.run(upload_bytes).await?;
//! println!("{} components", output.detection.components.len());
//! ```

mod provider;
mod service;
mod types;

pub use provider::{Detector, RemoteDetector};
pub use service::{DetectionService, PipelineError, PipelineOutput};
pub use types::{Detection, DetectionError, DetectionParameters, DetectionRequest, ElementCompo, Overlay};

#[cfg(test)]
pub use provider::StaticDetector;
