//! Shared utilities for the research council
//!
//! Logging setup and application configuration used by the binaries.

pub mod config;
pub mod logging;

pub use config::{AppConfig, LogFormat};
pub use logging::init_tracing;
