//! Shared error types and configuration for Kvitto.
//!
//! This crate provides the pieces used across all other crates:
//! - Application-wide error taxonomy
//! - Configuration management

pub mod config;
pub mod error;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
