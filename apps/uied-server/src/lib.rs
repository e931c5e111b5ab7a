//! UIED Server Library
//!
//! HTTP front end for UI element detection. Uploads are sized for analysis,
//! handed to an external detector, and answered either with the detected
//! components as JSON or with an annotated overlay image.
//!
//! # Modules
//!
//! - `resize`: target analysis height from an upload's dimensions
//! - `detection`: detector capability, HTTP detector client, pipeline glue
//! - `response`: JSON and JPEG response bodies
//! - `routes`: `/`, `/infer`, `/render` and `/health`

pub mod config;
pub mod detection;
pub mod error;
pub mod resize;
pub mod response;
pub mod routes;
pub mod state;
