//! PostgreSQL implementation of the campaign repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::campaign::{Campaign, CampaignRepository};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;

const CAMPAIGN_COLUMNS: &str = "id, user_id, campaign_name, prompt_id, retry_enabled, \
     retry_interval_minutes, max_retry_attempts, successful_calls, failed_calls, \
     total_numbers, created_at, updated_at";

#[derive(FromRow)]
struct CampaignRow {
    id: Uuid,
    user_id: Uuid,
    campaign_name: String,
    prompt_id: Uuid,
    retry_enabled: bool,
    retry_interval_minutes: i32,
    max_retry_attempts: i32,
    successful_calls: i32,
    failed_calls: i32,
    total_numbers: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CampaignRow> for Campaign {
    fn from(r: CampaignRow) -> Self {
        Campaign {
            id: r.id,
            user_id: r.user_id,
            campaign_name: r.campaign_name,
            prompt_id: r.prompt_id,
            retry_enabled: r.retry_enabled,
            retry_interval_minutes: r.retry_interval_minutes,
            max_retry_attempts: r.max_retry_attempts,
            successful_calls: r.successful_calls,
            failed_calls: r.failed_calls,
            total_numbers: r.total_numbers,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

pub struct PgCampaignRepository {
    pool: PgPool,
}

impl PgCampaignRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignRepository for PgCampaignRepository {
    async fn create(&self, campaign: &Campaign) -> Result<()> {
        debug!(
            "Creating campaign {} ({})",
            campaign.campaign_name, campaign.id
        );

        sqlx::query(
            r#"
            INSERT INTO campaigns (
                id, user_id, campaign_name, prompt_id, retry_enabled,
                retry_interval_minutes, max_retry_attempts,
                successful_calls, failed_calls, total_numbers,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(campaign.id)
        .bind(campaign.user_id)
        .bind(&campaign.campaign_name)
        .bind(campaign.prompt_id)
        .bind(campaign.retry_enabled)
        .bind(campaign.retry_interval_minutes)
        .bind(campaign.max_retry_attempts)
        .bind(campaign.successful_calls)
        .bind(campaign.failed_calls)
        .bind(campaign.total_numbers)
        .bind(campaign.created_at)
        .bind(campaign.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create campaign: {}", e);
            DomainError::Persistence(format!("Database error: {}", e))
        })?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Campaign>> {
        let row: Option<CampaignRow> = sqlx::query_as(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get campaign: {}", e);
            DomainError::Persistence(format!("Database error: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    async fn find_by_name(&self, user_id: Uuid, campaign_name: &str) -> Result<Option<Campaign>> {
        let row: Option<CampaignRow> = sqlx::query_as(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns \
             WHERE user_id = $1 AND campaign_name = $2 \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .bind(campaign_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to find campaign by name: {}", e);
            DomainError::Persistence(format!("Database error: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    async fn add_numbers(&self, id: Uuid, count: i32) -> Result<()> {
        let result = sqlx::query(
            "UPDATE campaigns \
             SET total_numbers = total_numbers + $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(count)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to grow campaign totals: {}", e);
            DomainError::Persistence(format!("Database error: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("campaign {}", id)));
        }
        Ok(())
    }

    async fn record_outcome(&self, id: Uuid, answered: bool) -> Result<()> {
        // In-place increment so concurrent workers never clobber each other.
        let sql = if answered {
            "UPDATE campaigns \
             SET successful_calls = successful_calls + 1, updated_at = NOW() \
             WHERE id = $1"
        } else {
            "UPDATE campaigns \
             SET failed_calls = failed_calls + 1, updated_at = NOW() \
             WHERE id = $1"
        };

        let result = sqlx::query(sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to update campaign counters: {}", e);
                DomainError::Persistence(format!("Database error: {}", e))
            })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("campaign {}", id)));
        }
        Ok(())
    }
}
