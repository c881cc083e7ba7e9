//! Shared domain types for Parley.
//!
//! This crate contains the domain types used across the Parley workspace:
//! chat sessions and messages, the LLM boundary, configuration, and the
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
