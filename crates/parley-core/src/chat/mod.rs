//! Chat session and message handling for Parley.
//!
//! - `repository`: the `ChatRepository` port the infrastructure layer implements
//! - `title`: one-time automatic session titles
//! - `assembler`: stored history to model conversation
//! - `service`: the `ChatService` orchestrator

pub mod assembler;
pub mod repository;
pub mod service;
pub mod title;
