//! Application layer - use cases and application services
//!
//! This layer orchestrates domain objects to fulfill use cases: the batch
//! dispatcher and the retry scheduler that re-invokes it.

pub mod dispatcher;
pub mod retry_scheduler;

pub use dispatcher::{DispatchRequest, DispatchResult, Dispatcher, DispatcherSettings};
pub use retry_scheduler::{RetryRunReport, RetryScheduler, SchedulerSettings};
