//! API DTOs for the dispatch and scheduler entry points
//!
//! The wire shapes mirror what the campaign UI has always submitted:
//! camelCase field names, with `phoneNumbersWithNames` entries themselves in
//! snake_case.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::dispatcher::{DispatchRequest, DispatchResult, DEFAULT_CONCURRENT_LIMIT};
use crate::domain::call_record::{RetryLineage, RetryPolicy};
use crate::domain::campaign::Campaign;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;

/// Batch dispatch request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequestDto {
    pub user_id: Uuid,
    pub campaign_name: String,
    pub prompt_id: Uuid,
    pub phone_numbers: Vec<String>,
    #[serde(default)]
    pub phone_numbers_with_names: Vec<NamedNumberDto>,
    pub concurrent_limit: Option<usize>,
    #[serde(default)]
    pub retry_enabled: bool,
    pub retry_interval_minutes: Option<i32>,
    pub max_retry_attempts: Option<i32>,
    #[serde(default)]
    pub is_retry: bool,
    pub parent_call_id: Option<Uuid>,
    pub current_retry_count: Option<i32>,
}

/// Entry of `phoneNumbersWithNames`.
#[derive(Debug, Deserialize)]
pub struct NamedNumberDto {
    pub phone_number: String,
    pub customer_name: String,
}

impl DispatchRequestDto {
    pub fn into_request(self) -> Result<DispatchRequest> {
        let lineage = if self.is_retry {
            let parent_call_id = self.parent_call_id.ok_or_else(|| {
                DomainError::Validation("isRetry requires parentCallId".into())
            })?;
            let retry_count = self.current_retry_count.ok_or_else(|| {
                DomainError::Validation("isRetry requires currentRetryCount".into())
            })?;
            Some(RetryLineage {
                parent_call_id,
                retry_count,
            })
        } else {
            None
        };

        Ok(DispatchRequest {
            user_id: self.user_id,
            campaign_name: self.campaign_name,
            prompt_id: self.prompt_id,
            phone_numbers: self.phone_numbers,
            customer_names: self
                .phone_numbers_with_names
                .into_iter()
                .map(|n| (n.phone_number, n.customer_name))
                .collect(),
            concurrent_limit: self.concurrent_limit.unwrap_or(DEFAULT_CONCURRENT_LIMIT),
            retry_policy: RetryPolicy {
                enabled: self.retry_enabled,
                interval_minutes: self.retry_interval_minutes.unwrap_or(30),
                max_attempts: self.max_retry_attempts.unwrap_or(3),
            },
            lineage,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DispatchSummaryDto {
    pub successful_calls: u32,
    pub failed_calls: u32,
}

/// Batch dispatch response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponseDto {
    pub summary: DispatchSummaryDto,
    pub campaign_id: Uuid,
    pub call_record_ids: Vec<Uuid>,
    pub invalid_numbers: u32,
}

impl From<DispatchResult> for DispatchResponseDto {
    fn from(result: DispatchResult) -> Self {
        DispatchResponseDto {
            summary: DispatchSummaryDto {
                successful_calls: result.successful_calls,
                failed_calls: result.failed_calls,
            },
            campaign_id: result.campaign_id,
            call_record_ids: result.call_record_ids,
            invalid_numbers: result.invalid_numbers,
        }
    }
}

/// Scheduler run response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerRunResponseDto {
    pub success: bool,
    pub message: String,
    pub retried_calls: usize,
}

/// Campaign aggregates, read-only reporting.
#[derive(Debug, Serialize)]
pub struct CampaignResponseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub campaign_name: String,
    pub prompt_id: Uuid,
    pub retry_enabled: bool,
    pub retry_interval_minutes: i32,
    pub max_retry_attempts: i32,
    pub successful_calls: i32,
    pub failed_calls: i32,
    pub total_numbers: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Campaign> for CampaignResponseDto {
    fn from(campaign: Campaign) -> Self {
        CampaignResponseDto {
            id: campaign.id,
            user_id: campaign.user_id,
            campaign_name: campaign.campaign_name,
            prompt_id: campaign.prompt_id,
            retry_enabled: campaign.retry_enabled,
            retry_interval_minutes: campaign.retry_interval_minutes,
            max_retry_attempts: campaign.max_retry_attempts,
            successful_calls: campaign.successful_calls,
            failed_calls: campaign.failed_calls,
            total_numbers: campaign.total_numbers,
            created_at: campaign.created_at,
            updated_at: campaign.updated_at,
        }
    }
}

/// Error payload returned by both entry points.
#[derive(Debug, Serialize)]
pub struct ErrorResponseDto {
    pub error: String,
    pub details: String,
}

/// Wraps a `DomainError` into the transport status it maps to. Pre-flight
/// rejections are client errors; everything unexpected is a 500.
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Unauthorized(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Gateway(_)
            | DomainError::Persistence(_)
            | DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponseDto {
            error: self.0.to_string(),
            details: format!("{:?}", self.0),
        };
        (status, Json(body)).into_response()
    }
}
