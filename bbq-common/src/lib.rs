//! # BBQ Common Library
//!
//! Shared code for the BBQ fantasy-baseball services:
//! - Configuration loading and root folder resolution
//! - Database initialization, migrations and player models
//! - Caller identity and access guards
//! - Common error type

pub mod api;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;

pub use error::{Error, Result};
