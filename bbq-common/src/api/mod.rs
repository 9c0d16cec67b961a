//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared types
//!
//! Each service wraps these with framework-specific middleware (Axum, etc.).

pub mod auth;

pub use auth::{AccessError, Caller, ADMIN_ROLE, USER_ID_HEADER, USER_ROLE_HEADER};
