//! Core functionality for SurveyLink.
//!
//! This crate provides the ambient pieces shared by every SurveyLink crate:
//! configuration loading, the core error type and logging initialization.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ApiConfig, ChannelConfig, SyncConfig, TimeoutConfig, ViewConfig};
pub use error::{CoreError, Result};
