// src/integrations/detector/mod.rs
//
// Damage Detector Integration
//
// ARCHITECTURE:
// - The detector is a black-box classifier: bytes in, detections out
// - Adapters are injected into the inspection service at construction
// - Adapters never touch repositories or domain state
// - Timeouts and transport failures surface as DetectionError; no retries here

pub mod client;

pub use client::HttpDetectionAdapter;

use thiserror::Error;

use crate::domain::DetectionResult;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Detector unavailable: {0}")]
    Unavailable(String),

    #[error("Detector timed out")]
    Timeout,

    #[error("Detector returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Contract for damage detectors
///
/// Implementations may be non-deterministic but must be side-effect free from
/// the engine's perspective. An empty result means no damage was found.
#[cfg_attr(test, mockall::automock)]
pub trait DetectionAdapter: Send + Sync {
    fn detect(&self, image: &[u8]) -> Result<Vec<DetectionResult>, DetectionError>;
}
