//! # Gatepass Common Library
//!
//! Shared code for the gatepass services including:
//! - Canonical visit status vocabulary (one alias table for every caller)
//! - Database initialization and row models
//! - Event types (GateEvent enum) and the EventBus
//! - Configuration loading
//! - Utility functions

pub mod catalog;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod ids;
pub mod sse;
pub mod status;
pub mod validation;

pub use error::{Error, Result};
pub use status::CanonicalStatus;
