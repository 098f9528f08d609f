//! Relay Server - HTTP API for the relay gateway
//!
//! This crate provides:
//! - OpenAI-compatible chat, vector store and file endpoints
//! - Unified cross-backend resource ids on the managed resource routes
//! - API key authentication middleware
//! - Health endpoint

pub mod api;
pub mod middleware;
pub mod state;

pub use api::create_router;
pub use state::AppState;
