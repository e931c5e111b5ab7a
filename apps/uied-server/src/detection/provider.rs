//! Detector Backends
//!
//! Defines the detector capability and the HTTP client for an external
//! detector process.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use super::types::{
    Detection, DetectionError, DetectionParameters, DetectionRequest, ElementCompo, Overlay,
};
use crate::resize::TargetHeight;

/// UI element detector capability
#[async_trait]
pub trait Detector: Send + Sync {
    /// Short backend name, used in logs and health output
    fn name(&self) -> &'static str;

    /// Check if the backend can currently accept work
    async fn is_available(&self) -> bool;

    /// Detect UI components in one image. Called once per request, never retried.
    async fn detect(&self, request: DetectionRequest) -> Result<Detection, DetectionError>;
}

/// Upper bound on a health check; detection calls themselves have none
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Detector running as a separate HTTP service
pub struct RemoteDetector {
    /// Detector API URL
    base_url: String,
    client: reqwest::Client,
    health_timeout: Duration,
}

/// Body of `POST {base_url}/detect`
#[derive(Serialize)]
struct RemoteDetectRequest<'a> {
    image: String,
    params: &'a DetectionParameters,
    resize_by_height: TargetHeight,
    classifier: Option<String>,
    show: bool,
    render: bool,
}

/// Either `compos` (plus an optional overlay) or an `error` reported by the detector
#[derive(Deserialize)]
struct RemoteDetectResponse {
    #[serde(default)]
    compos: Option<Vec<ElementCompo>>,
    #[serde(default)]
    result_image: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl RemoteDetector {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            health_timeout: HEALTH_CHECK_TIMEOUT,
        }
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }
}

#[async_trait]
impl Detector for RemoteDetector {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/health", self.base_url);

        match self.client.get(&url).timeout(self.health_timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn detect(&self, request: DetectionRequest) -> Result<Detection, DetectionError> {
        let url = format!("{}/detect", self.base_url);

        let body = RemoteDetectRequest {
            image: BASE64.encode(&request.image),
            params: &request.params,
            resize_by_height: request.resize_by_height,
            classifier: None,
            show: false,
            render: request.render,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DetectionError::ApiError(format!("Failed to call detector: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DetectionError::ApiError(format!(
                "Detector returned {}: {}",
                status, text
            )));
        }

        let parsed: RemoteDetectResponse = response
            .json()
            .await
            .map_err(|e| DetectionError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        if let Some(message) = parsed.error {
            return Err(DetectionError::ProcessingError(message));
        }

        let components = parsed
            .compos
            .ok_or_else(|| DetectionError::InvalidResponse("Response has no compos".to_string()))?;

        // An overlay is only meaningful when one was asked for
        let overlay = match parsed.result_image {
            Some(encoded) if request.render => Some(decode_overlay(&encoded)?),
            _ => None,
        };

        tracing::debug!(
            components = components.len(),
            has_overlay = overlay.is_some(),
            "Remote detection complete"
        );

        Ok(Detection { components, overlay })
    }
}

fn decode_overlay(encoded: &str) -> Result<Overlay, DetectionError> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| DetectionError::InvalidResponse(format!("Overlay is not valid base64: {}", e)))?;

    Overlay::from_encoded(bytes)
        .map_err(|e| DetectionError::InvalidResponse(format!("Failed to decode overlay: {}", e)))
}

/// Detector returning fixed fixtures, for tests
#[cfg(test)]
#[derive(Default)]
pub struct StaticDetector {
    pub components: Vec<ElementCompo>,
    pub overlay: Option<Overlay>,
    /// When set, every call fails with this message
    pub failure: Option<String>,
    pub calls: std::sync::Mutex<Vec<DetectionRequest>>,
}

#[cfg(test)]
impl StaticDetector {
    pub fn with_components(components: Vec<ElementCompo>) -> Self {
        Self {
            components,
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn with_overlay(mut self, overlay: image::DynamicImage) -> Self {
        self.overlay = Some(Overlay::Image(overlay));
        self
    }

    pub fn calls(&self) -> Vec<DetectionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Detector for StaticDetector {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn is_available(&self) -> bool {
        self.failure.is_none()
    }

    async fn detect(&self, request: DetectionRequest) -> Result<Detection, DetectionError> {
        let render = request.render;
        self.calls.lock().unwrap().push(request);

        if let Some(message) = &self.failure {
            return Err(DetectionError::ProcessingError(message.clone()));
        }

        Ok(Detection {
            components: self.components.clone(),
            overlay: if render { self.overlay.clone() } else { None },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        routing::{get, post},
        Json, Router,
    };
    use image::{ImageFormat, RgbImage};
    use serde_json::{json, Value};
    use std::io::Cursor;

    async fn spawn_detector(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn overlay_png() -> String {
        let mut buffer = Vec::new();
        RgbImage::from_pixel(6, 4, image::Rgb([0, 255, 0]))
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        BASE64.encode(buffer)
    }

    fn request(render: bool) -> DetectionRequest {
        DetectionRequest {
            image: bytes::Bytes::from_static(&[1, 2, 3]),
            params: DetectionParameters::default(),
            resize_by_height: crate::resize::target_height_for(200, 100, 1366),
            render,
        }
    }

    #[tokio::test]
    async fn test_remote_detect_sends_contract_and_decodes_overlay() {
        let overlay = overlay_png();
        let router = Router::new().route(
            "/detect",
            post(move |Json(body): Json<Value>| {
                let overlay = overlay.clone();
                async move {
                    assert_eq!(body["image"], "AQID");
                    assert_eq!(body["resize_by_height"], 683);
                    assert_eq!(body["params"]["min-grad"], 25);
                    assert_eq!(body["classifier"], Value::Null);
                    assert_eq!(body["show"], false);
                    assert_eq!(body["render"], true);
                    Json(json!({
                        "compos": [{"id": 0, "class": "Compo"}],
                        "result_image": overlay,
                    }))
                }
            }),
        );
        let url = spawn_detector(router).await;

        let detection = RemoteDetector::new(&url).detect(request(true)).await.unwrap();

        assert_eq!(detection.components.len(), 1);
        assert_eq!(detection.components[0].as_value()["class"], "Compo");
        match detection.overlay.expect("overlay") {
            Overlay::Image(img) => assert_eq!((img.width(), img.height()), (6, 4)),
            other => panic!("PNG overlay should be decoded, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_detect_passes_jpeg_overlay_through() {
        let mut jpeg = Vec::new();
        RgbImage::from_pixel(6, 4, image::Rgb([0, 0, 255]))
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();
        let encoded = BASE64.encode(&jpeg);
        let router = Router::new().route(
            "/detect",
            post(move || {
                let encoded = encoded.clone();
                async move { Json(json!({ "compos": [], "result_image": encoded })) }
            }),
        );
        let url = spawn_detector(router).await;

        let detection = RemoteDetector::new(&url).detect(request(true)).await.unwrap();

        match detection.overlay.expect("overlay") {
            Overlay::Jpeg(bytes) => assert_eq!(bytes, jpeg),
            other => panic!("JPEG overlay should pass through, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_detect_reports_detector_side_failure() {
        let router = Router::new().route(
            "/detect",
            post(|| async { Json(json!({ "error": "binary map is empty" })) }),
        );
        let url = spawn_detector(router).await;

        let err = RemoteDetector::new(&url).detect(request(true)).await.unwrap_err();

        assert!(matches!(err, DetectionError::ProcessingError(_)));
        assert_eq!(err.to_string(), "Detection failed: binary map is empty");
    }

    #[tokio::test]
    async fn test_remote_detect_requires_compos() {
        let router = Router::new().route("/detect", post(|| async { Json(json!({})) }));
        let url = spawn_detector(router).await;

        let err = RemoteDetector::new(&url).detect(request(true)).await.unwrap_err();

        assert!(matches!(err, DetectionError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_health_check_gives_up_on_stalled_detector() {
        let router = Router::new().route(
            "/health",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "ok"
            }),
        );
        let url = spawn_detector(router).await;
        let detector = RemoteDetector::new(&url).with_health_timeout(Duration::from_millis(100));

        let started = std::time::Instant::now();
        assert!(!detector.is_available().await);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_health_check_succeeds() {
        let router = Router::new().route("/health", get(|| async { "ok" }));
        let url = spawn_detector(router).await;

        assert!(RemoteDetector::new(&url).is_available().await);
    }

    #[tokio::test]
    async fn test_remote_detect_without_overlay() {
        let router = Router::new().route(
            "/detect",
            post(|| async { Json(json!({ "compos": [], "result_image": null })) }),
        );
        let url = spawn_detector(router).await;

        let detection = RemoteDetector::new(&format!("{}/", url))
            .detect(request(true))
            .await
            .unwrap();

        assert!(detection.components.is_empty());
        assert!(detection.overlay.is_none());
    }

    #[tokio::test]
    async fn test_remote_detect_surfaces_server_errors() {
        let router = Router::new().route(
            "/detect",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "segmentation blew up") }),
        );
        let url = spawn_detector(router).await;

        let err = RemoteDetector::new(&url).detect(request(true)).await.unwrap_err();

        assert!(matches!(err, DetectionError::ApiError(_)));
        assert!(err.to_string().contains("segmentation blew up"));
    }

    #[tokio::test]
    async fn test_remote_detect_rejects_bad_overlay() {
        let router = Router::new().route(
            "/detect",
            post(|| async { Json(json!({ "compos": [], "result_image": "%%%not-base64" })) }),
        );
        let url = spawn_detector(router).await;

        let err = RemoteDetector::new(&url).detect(request(true)).await.unwrap_err();

        assert!(matches!(err, DetectionError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_detector() {
        // Grab a free port, then stop listening on it
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let detector = RemoteDetector::new(&format!("http://{}", addr));

        assert!(!detector.is_available().await);
        assert!(matches!(
            detector.detect(request(true)).await,
            Err(DetectionError::ApiError(_))
        ));
    }

    #[tokio::test]
    async fn test_static_detector_records_calls() {
        let detector = StaticDetector::with_components(vec![ElementCompo::new(json!({"id": 1}))]);

        let detection = detector.detect(request(false)).await.unwrap();

        assert_eq!(detection.components.len(), 1);
        assert_eq!(detector.calls().len(), 1);
        assert!(!detector.calls()[0].render);
    }
}
