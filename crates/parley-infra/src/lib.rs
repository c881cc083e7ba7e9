//! Infrastructure layer for Parley.
//!
//! Contains implementations of the ports defined in `parley-core`: SQLite
//! chat storage, the Gemini LLM provider, and configuration loading.

pub mod config;
pub mod llm;
pub mod sqlite;
