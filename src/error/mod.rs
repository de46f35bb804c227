// src/error/mod.rs
//
// Application-level error type shared by repositories, services and the
// application layer.

pub mod types;

pub use types::{AppError, AppResult, ErrorKind};
