//! PostgreSQL implementation of the call record repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::call_record::{CallRecord, CallRecordRepository, CallStatus};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;

const RECORD_COLUMNS: &str = "id, campaign_id, user_id, parent_call_id, phone_number, \
     customer_name, status, retry_count, retry_enabled, retry_interval_minutes, \
     max_retry_attempts, last_retry_at, next_retry_at, created_at";

#[derive(FromRow)]
struct CallRecordRow {
    id: Uuid,
    campaign_id: Uuid,
    user_id: Uuid,
    parent_call_id: Option<Uuid>,
    phone_number: String,
    customer_name: Option<String>,
    status: String,
    retry_count: i32,
    retry_enabled: bool,
    retry_interval_minutes: i32,
    max_retry_attempts: i32,
    last_retry_at: Option<DateTime<Utc>>,
    next_retry_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<CallRecordRow> for CallRecord {
    fn from(r: CallRecordRow) -> Self {
        CallRecord {
            id: r.id,
            campaign_id: r.campaign_id,
            user_id: r.user_id,
            parent_call_id: r.parent_call_id,
            phone_number: r.phone_number,
            customer_name: r.customer_name,
            status: CallStatus::from_str(&r.status).unwrap_or(CallStatus::Failed),
            retry_count: r.retry_count,
            retry_enabled: r.retry_enabled,
            retry_interval_minutes: r.retry_interval_minutes,
            max_retry_attempts: r.max_retry_attempts,
            last_retry_at: r.last_retry_at,
            next_retry_at: r.next_retry_at,
            created_at: r.created_at,
        }
    }
}

pub struct PgCallRecordRepository {
    pool: PgPool,
}

impl PgCallRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CallRecordRepository for PgCallRecordRepository {
    async fn create(&self, record: &CallRecord) -> Result<()> {
        debug!("Creating call record {}", record.id);

        sqlx::query(
            r#"
            INSERT INTO call_records (
                id, campaign_id, user_id, parent_call_id, phone_number,
                customer_name, status, retry_count, retry_enabled,
                retry_interval_minutes, max_retry_attempts,
                last_retry_at, next_retry_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(record.id)
        .bind(record.campaign_id)
        .bind(record.user_id)
        .bind(record.parent_call_id)
        .bind(&record.phone_number)
        .bind(&record.customer_name)
        .bind(record.status.as_str())
        .bind(record.retry_count)
        .bind(record.retry_enabled)
        .bind(record.retry_interval_minutes)
        .bind(record.max_retry_attempts)
        .bind(record.last_retry_at)
        .bind(record.next_retry_at)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create call record: {}", e);
            DomainError::Persistence(format!("Database error: {}", e))
        })?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<CallRecord>> {
        let row: Option<CallRecordRow> = sqlx::query_as(&format!(
            "SELECT {RECORD_COLUMNS} FROM call_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to get call record: {}", e);
            DomainError::Persistence(format!("Database error: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    async fn list_by_campaign(&self, campaign_id: Uuid) -> Result<Vec<CallRecord>> {
        let rows: Vec<CallRecordRow> = sqlx::query_as(&format!(
            "SELECT {RECORD_COLUMNS} FROM call_records \
             WHERE campaign_id = $1 ORDER BY created_at DESC"
        ))
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to list call records: {}", e);
            DomainError::Persistence(format!("Database error: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_due_for_retry(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<CallRecord>> {
        debug!("Scanning call records due for retry at {}", now);

        // A record already stamped by a previous run is terminal for itself;
        // its lineage continues through the child record. Records without an
        // explicit schedule fall back to elapsed time since creation.
        let rows: Vec<CallRecordRow> = sqlx::query_as(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM call_records
            WHERE retry_enabled
              AND status <> 'answered'
              AND retry_count < max_retry_attempts
              AND last_retry_at IS NULL
              AND (
                    (next_retry_at IS NOT NULL AND next_retry_at <= $1)
                 OR (next_retry_at IS NULL
                     AND created_at + retry_interval_minutes * INTERVAL '1 minute' <= $1)
              )
            ORDER BY next_retry_at ASC NULLS LAST
            LIMIT $2
            "#
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to scan for due retries: {}", e);
            DomainError::Persistence(format!("Database error: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn stamp_retry(
        &self,
        id: Uuid,
        observed_next_retry_at: Option<DateTime<Utc>>,
        last_retry_at: DateTime<Utc>,
        next_retry_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        // Compare-and-set on the schedule read by the scan: an overlapping
        // run that already stamped the record makes this a no-op.
        let result = sqlx::query(
            r#"
            UPDATE call_records
            SET last_retry_at = $2, next_retry_at = $3
            WHERE id = $1
              AND last_retry_at IS NULL
              AND next_retry_at IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(id)
        .bind(last_retry_at)
        .bind(next_retry_at)
        .bind(observed_next_retry_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to stamp retried record: {}", e);
            DomainError::Persistence(format!("Database error: {}", e))
        })?;

        Ok(result.rows_affected() == 1)
    }
}
