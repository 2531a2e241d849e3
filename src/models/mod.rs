//! Model invocation
//!
//! Provides the completion capability the executor calls and its HTTP
//! implementation.

pub mod client;

pub use client::{CompletionClient, HttpCompletionClient};
