// src/utils/mod.rs
//! Shared utilities: errors and application configuration

pub mod config;
pub mod errors;

pub use config::DispatchConfig;
pub use errors::{BoxError, DispatchError, Result};
