// src/integrations/detector/client.rs
//
// HTTP Damage Detector Client
//
// POSTs raw image bytes to an inference endpoint and maps the response into
// DetectionResult values. This is INFRASTRUCTURE, not DOMAIN.
//
// Expected response body:
//   {"detections": [{"class_name": "dent", "confidence": 0.91,
//                    "bbox": {"x1": 0.1, "y1": 0.2, "x2": 0.4, "y2": 0.5}}]}

use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header;
use serde::Deserialize;

use super::{DetectionAdapter, DetectionError};
use crate::domain::{BoundingBox, DetectionResult};

/// Detector response wrapper
#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Vec<DetectionData>,
}

#[derive(Debug, Deserialize)]
struct DetectionData {
    #[serde(default = "unknown_class")]
    class_name: String,
    #[serde(default)]
    confidence: f64,
    bbox: BboxData,
}

#[derive(Debug, Deserialize)]
struct BboxData {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

fn unknown_class() -> String {
    "unknown".to_string()
}

/// Damage detector reached over HTTP
pub struct HttpDetectionAdapter {
    endpoint: String,
    http_client: Client,
}

impl HttpDetectionAdapter {
    /// Create a client with a bounded request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, DetectionError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DetectionError::Unavailable(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Parse a detector response body
    fn parse_body(body: &str) -> Result<Vec<DetectionResult>, DetectionError> {
        let parsed: DetectResponse = serde_json::from_str(body)
            .map_err(|e| DetectionError::MalformedResponse(e.to_string()))?;

        Ok(parsed
            .detections
            .into_iter()
            .map(|d| DetectionResult {
                class_name: d.class_name,
                confidence: d.confidence,
                bbox: BoundingBox::new(d.bbox.x1, d.bbox.y1, d.bbox.x2, d.bbox.y2),
            })
            .collect())
    }
}

impl DetectionAdapter for HttpDetectionAdapter {
    fn detect(&self, image: &[u8]) -> Result<Vec<DetectionResult>, DetectionError> {
        debug!("Sending {} bytes to detector at {}", image.len(), self.endpoint);

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(header::ACCEPT, "application/json")
            .body(image.to_vec())
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    DetectionError::Timeout
                } else {
                    DetectionError::Unavailable(format!("Detector request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Detector at {} returned status {}", self.endpoint, status);
            return Err(DetectionError::Unavailable(format!(
                "Detector returned status: {}",
                status
            )));
        }

        let body = response
            .text()
            .map_err(|e| DetectionError::MalformedResponse(e.to_string()))?;

        Self::parse_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detections() {
        let body = r#"{"detections": [
            {"class_name": "crushed_corner", "confidence": 0.88,
             "bbox": {"x1": 0.1, "y1": 0.2, "x2": 0.3, "y2": 0.4}, "area": 0.04}
        ], "model_info": {"name": "yolo"}}"#;

        let detections = HttpDetectionAdapter::parse_body(body).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].class_name, "crushed_corner");
        assert_eq!(detections[0].confidence, 0.88);
        assert_eq!(detections[0].bbox, BoundingBox::new(0.1, 0.2, 0.3, 0.4));
    }

    #[test]
    fn test_parse_defaults_missing_label() {
        let body = r#"{"detections": [{"confidence": 0.5,
            "bbox": {"x1": 0, "y1": 0, "x2": 1, "y2": 1}}]}"#;
        let detections = HttpDetectionAdapter::parse_body(body).unwrap();
        assert_eq!(detections[0].class_name, "unknown");
    }

    #[test]
    fn test_parse_empty_and_missing_list() {
        assert!(HttpDetectionAdapter::parse_body(r#"{"detections": []}"#)
            .unwrap()
            .is_empty());
        assert!(HttpDetectionAdapter::parse_body(r#"{"has_damage": false}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            HttpDetectionAdapter::parse_body("<html>oops</html>"),
            Err(DetectionError::MalformedResponse(_))
        ));
        assert!(HttpDetectionAdapter::parse_body(r#"{"detections": [{"confidence": 0.5}]}"#)
            .is_err());
    }

    #[test]
    fn test_unreachable_endpoint_is_unavailable() {
        let adapter =
            HttpDetectionAdapter::new("http://127.0.0.1:9/detect", Duration::from_millis(500))
                .unwrap();
        let result = adapter.detect(b"jpeg");
        assert!(matches!(
            result,
            Err(DetectionError::Unavailable(_)) | Err(DetectionError::Timeout)
        ));
    }
}
