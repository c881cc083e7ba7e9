//! HTTP/REST API layer for Parley.
//!
//! Axum-based JSON API under `/api/` with permissive CORS, consumed by a
//! browser frontend served from another origin.

pub mod error;
pub mod handlers;
pub mod router;
