//! Relay Core - Core types for Relay Gateway
//!
//! This crate provides the foundational types used across the gateway:
//! - LLM request/response types (OpenAI-compatible)
//! - Managed resource payload types (vector stores, files)
//! - Error types
//! - Configuration types

pub mod auth;
pub mod config;
pub mod error;
pub mod llm;

pub use auth::Principal;
pub use error::{GatewayError, GatewayResult};
