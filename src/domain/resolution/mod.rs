// src/domain/resolution/mod.rs
//
// Resolution Domain
//
// The auto-resolution decision engine and its value objects.
//
// CRITICAL RULES:
// - All types are pure value objects (immutable)
// - No side effects
// - No persistence
// - No event emission (that's the service's job)
// - Deterministic: same evidence + settings -> same decision

pub mod rules;
pub mod value_objects;

pub use rules::{damage_score, evaluate};
pub use value_objects::{Decision, InspectionEvidence, ResolutionAction, ResolutionRule};
