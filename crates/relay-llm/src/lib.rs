//! Relay LLM - Multi-provider routing and unified resource addressing
//!
//! This crate provides:
//! - Provider abstraction for multiple LLM backends
//! - Deployment-based request routing with failover
//! - The unified cross-backend resource layer: identifier codec, managed
//!   resource protocol, deployment filter, and request hook

pub mod provider;
pub mod providers;
pub mod router;
pub mod unified;

pub use provider::{Provider, ProviderRegistry};
pub use providers::{AnthropicProvider, OpenAIProvider};
pub use router::{Deployment, Router};
