//! Dispatch API handlers

use axum::extract::{Path, State};
use axum::Json;
use tracing::info;
use uuid::Uuid;

use super::dto::{ApiError, CampaignResponseDto, DispatchRequestDto, DispatchResponseDto};
use super::router::AppState;
use crate::domain::shared::error::DomainError;

/// Launch a batch of calls.
pub async fn dispatch_batch(
    State(state): State<AppState>,
    Json(dto): Json<DispatchRequestDto>,
) -> Result<Json<DispatchResponseDto>, ApiError> {
    info!(
        campaign = %dto.campaign_name,
        numbers = dto.phone_numbers.len(),
        is_retry = dto.is_retry,
        "API: dispatch request"
    );

    let request = dto.into_request()?;
    let result = state.dispatcher.dispatch(request).await?;
    Ok(Json(result.into()))
}

/// Campaign aggregates for reporting.
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignResponseDto>, ApiError> {
    match state.campaigns.get_by_id(id).await? {
        Some(campaign) => Ok(Json(campaign.into())),
        None => Err(DomainError::NotFound(format!("campaign {}", id)).into()),
    }
}
