// src/integrations/mod.rs
//
// External Integrations
//
// ARCHITECTURE:
// - Infrastructure clients for external collaborators
// - Never create or modify domain entities directly

pub mod detector;

pub use detector::{DetectionAdapter, DetectionError, HttpDetectionAdapter};
