// src/application/commands/mod.rs
//
// Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between callers and Services
// - Commands accept DTOs or plain strings, return DTOs
// - Commands convert errors into ErrorResponse
// - Commands NEVER contain business logic beyond boundary validation

pub mod inspection_commands;
pub mod parcel_commands;
pub mod resolution_commands;
pub mod settings_commands;

pub use inspection_commands::*;
pub use parcel_commands::*;
pub use resolution_commands::*;
pub use settings_commands::*;

use uuid::Uuid;

use crate::application::error_handling::{CommandResult, ErrorResponse};

pub(crate) fn parse_id(value: &str, what: &str) -> CommandResult<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|e| ErrorResponse::validation(format!("Invalid {} id '{}': {}", what, value, e)))
}
