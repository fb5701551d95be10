//! Analysis service abstraction for the research council
//!
//! Each council agent produces its text by calling an external analysis
//! service. This crate provides:
//!
//! - Request and response envelope types
//! - The [`AnalysisService`] trait
//! - [`analyze_with_deadline`], which bounds a call with a cancellation token
//! - An HTTP client implementation (behind the `http` feature)

pub mod deadline;
pub mod error;
pub mod request;
pub mod service;

// Re-export main types
pub use deadline::analyze_with_deadline;
pub use error::{AnalysisError, Result};
pub use request::{AnalysisRequest, AnalysisResponse};
pub use service::AnalysisService;

// HTTP client (feature-gated)
#[cfg(feature = "http")]
pub mod http;
