//! API interface implementations

pub mod dispatch_handler;
pub mod dto;
pub mod metrics_handler;
pub mod router;
pub mod scheduler_handler;

pub use metrics_handler::init_metrics;
pub use router::{build_router, AppState};
