//! Retry scheduler API handler
//!
//! Triggered by an external cron on a fixed cadence. An empty eligible set is
//! a normal outcome, not an error.

use axum::extract::State;
use axum::Json;
use tracing::info;

use super::dto::{ApiError, SchedulerRunResponseDto};
use super::router::AppState;

pub async fn run_scheduler(
    State(state): State<AppState>,
) -> Result<Json<SchedulerRunResponseDto>, ApiError> {
    info!("API: scheduler run requested");

    let report = state.scheduler.run_once().await?;
    let message = if report.eligible == 0 {
        "No call records due for retry".to_string()
    } else {
        format!(
            "Retry processing completed: {} of {} eligible records retried",
            report.retried, report.eligible
        )
    };

    Ok(Json(SchedulerRunResponseDto {
        success: true,
        message,
        retried_calls: report.retried,
    }))
}
