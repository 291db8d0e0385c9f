//! # API Shared
//!
//! Shared definitions for the Illness Intel APIs.
//!
//! Contains:
//! - Request/response types (`dto` module), serialisable and documented for OpenAPI
//! - Shared services like `HealthService`
//!
//! Used by `api-rest`; kept separate so clients can depend on the shapes without axum.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
