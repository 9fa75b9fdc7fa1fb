//! edumap Core - Domain models, errors, and configuration
//!
//! This crate holds the school and district records, the analysis result
//! types consumed by presentation layers, and the layered configuration.

pub mod config;
pub mod error;
pub mod models;

pub use config::{LayeredConfig, ProjectionKind};
pub use error::{EdumapError, Result};
