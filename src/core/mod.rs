//! Core module - shared infrastructure for Leadflow
//!
//! This module contains foundational types, configuration, and error handling
//! used throughout the application.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AmbiguityPolicy, Config, StoreBackend};
pub use error::{LeadflowError, Result};
pub use types::*;
