//! Tierroute - tiered model router with retry and escalation
//!
//! This library classifies a prompt and its conversation history into one of
//! four capability tiers, calls the tier's model, retries transient failures,
//! and escalates failing local requests once to the L3 cloud model.

pub mod cli;
pub mod config;
pub mod conversation;
pub mod error;
pub mod execution;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod router;
pub mod telemetry;
