//! Outdial - an outbound voice-campaign dialing engine built with Rust
//!
//! This is a Domain-Driven Design (DDD) implementation of a campaign dialer
//! that places batches of calls concurrently under a throughput cap and
//! re-attempts unanswered numbers on a timed schedule.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use domain::shared::error::DomainError;
pub use domain::shared::result::Result;
