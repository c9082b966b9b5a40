//! Call record domain model
//!
//! A `CallRecord` captures one outbound-call attempt. Retries are modeled as
//! new records linked to the attempt they re-dial through `parent_call_id`,
//! so a lineage of attempts is a chain of records rather than a mutable
//! counter on a single row.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::error::DomainError;
use super::shared::result::Result;

/// Outcome of a call attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// Attempt created, gateway interaction not settled yet
    Pending,
    /// The callee picked up
    Answered,
    /// The call rang out or was declined
    NotAnswered,
    /// The gateway reported an error or the call timed out
    Failed,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Pending => "pending",
            CallStatus::Answered => "answered",
            CallStatus::NotAnswered => "not_answered",
            CallStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CallStatus::Pending),
            "answered" => Some(CallStatus::Answered),
            "not_answered" => Some(CallStatus::NotAnswered),
            "failed" => Some(CallStatus::Failed),
            _ => None,
        }
    }
}

/// Retry policy carried by a campaign and stamped onto every record it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub enabled: bool,
    pub interval_minutes: i32,
    pub max_attempts: i32,
}

impl RetryPolicy {
    pub const MIN_INTERVAL_MINUTES: i32 = 5;
    pub const MAX_INTERVAL_MINUTES: i32 = 1440;
    pub const MIN_ATTEMPTS: i32 = 1;
    pub const MAX_ATTEMPTS: i32 = 10;

    pub fn validate(&self) -> Result<()> {
        if !(Self::MIN_INTERVAL_MINUTES..=Self::MAX_INTERVAL_MINUTES)
            .contains(&self.interval_minutes)
        {
            return Err(DomainError::Validation(format!(
                "retry interval must be between {} and {} minutes, got {}",
                Self::MIN_INTERVAL_MINUTES,
                Self::MAX_INTERVAL_MINUTES,
                self.interval_minutes
            )));
        }
        if !(Self::MIN_ATTEMPTS..=Self::MAX_ATTEMPTS).contains(&self.max_attempts) {
            return Err(DomainError::Validation(format!(
                "max retry attempts must be between {} and {}, got {}",
                Self::MIN_ATTEMPTS,
                Self::MAX_ATTEMPTS,
                self.max_attempts
            )));
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: 30,
            max_attempts: 3,
        }
    }
}

/// Link from a retry attempt back to the record it re-dials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryLineage {
    pub parent_call_id: Uuid,
    /// Attempt number of the new record (parent's retry_count + 1).
    pub retry_count: i32,
}

/// One outbound-call attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub parent_call_id: Option<Uuid>,

    /// Display string as submitted; dialed and stored verbatim.
    pub phone_number: String,
    pub customer_name: Option<String>,

    pub status: CallStatus,

    pub retry_count: i32,
    pub retry_enabled: bool,
    pub retry_interval_minutes: i32,
    pub max_retry_attempts: i32,
    pub last_retry_at: Option<DateTime<Utc>>,
    pub next_retry_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl CallRecord {
    /// Create a record for one attempt. Fresh batches carry no lineage and
    /// start at retry_count 0; retry dispatches carry the parent link and the
    /// incremented attempt number.
    pub fn new(
        campaign_id: Uuid,
        user_id: Uuid,
        phone_number: String,
        customer_name: Option<String>,
        policy: RetryPolicy,
        lineage: Option<RetryLineage>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            campaign_id,
            user_id,
            parent_call_id: lineage.map(|l| l.parent_call_id),
            phone_number,
            customer_name,
            status: CallStatus::Pending,
            retry_count: lineage.map(|l| l.retry_count).unwrap_or(0),
            retry_enabled: policy.enabled,
            retry_interval_minutes: policy.interval_minutes,
            max_retry_attempts: policy.max_attempts,
            last_retry_at: None,
            next_retry_at: None,
            created_at: Utc::now(),
        }
    }

    /// Apply the gateway outcome.
    ///
    /// Non-answered outcomes with retry enabled and attempts remaining get an
    /// explicit schedule (`created_at + interval`). An answered call, a
    /// disabled policy, or an exhausted lineage clears the schedule.
    pub fn settle(&mut self, status: CallStatus) {
        self.status = status;
        self.next_retry_at = if status != CallStatus::Answered
            && self.retry_enabled
            && self.retry_count < self.max_retry_attempts
        {
            Some(self.created_at + Duration::minutes(self.retry_interval_minutes as i64))
        } else {
            None
        };
    }

    /// The policy this record was dispatched under.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            enabled: self.retry_enabled,
            interval_minutes: self.retry_interval_minutes,
            max_attempts: self.max_retry_attempts,
        }
    }

    /// True once this lineage has used up its retry budget.
    pub fn is_exhausted(&self) -> bool {
        self.retry_count >= self.max_retry_attempts
    }

    /// Schedule stamp for this record after the scheduler re-dispatched it:
    /// `last_retry_at = now`, and a further `next_retry_at` only while the
    /// lineage still has budget after the attempt just made.
    pub fn retry_stamp(&self, now: DateTime<Utc>) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
        let next = if self.retry_count + 1 < self.max_retry_attempts {
            Some(now + Duration::minutes(self.retry_interval_minutes as i64))
        } else {
            None
        };
        (now, next)
    }

    /// Scheduler eligibility. Mirrored in SQL by the Postgres repository;
    /// kept here so the in-memory store and the tests share one definition.
    ///
    /// A record that has already been retried (`last_retry_at` stamped) is
    /// terminal for itself - its lineage continues through the child record.
    /// Records without an explicit schedule fall back to measuring elapsed
    /// time from `created_at`.
    pub fn is_due_for_retry(&self, now: DateTime<Utc>) -> bool {
        self.retry_enabled
            && self.status != CallStatus::Answered
            && self.retry_count < self.max_retry_attempts
            && self.last_retry_at.is_none()
            && match self.next_retry_at {
                Some(at) => at <= now,
                None => {
                    self.created_at + Duration::minutes(self.retry_interval_minutes as i64) <= now
                }
            }
    }
}

/// Call record store operations used by the dispatcher and the scheduler.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CallRecordRepository: Send + Sync {
    /// Persist a new record.
    async fn create(&self, record: &CallRecord) -> Result<()>;

    /// Fetch a record by id.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<CallRecord>>;

    /// All records owned by a campaign.
    async fn list_by_campaign(&self, campaign_id: Uuid) -> Result<Vec<CallRecord>>;

    /// Records currently eligible for another attempt, capped at `limit`.
    async fn list_due_for_retry(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<CallRecord>>;

    /// Conditionally stamp a record after its retry was dispatched.
    ///
    /// The update only lands when `next_retry_at` still equals
    /// `observed_next_retry_at` and the record has not been stamped before,
    /// so two overlapping scheduler runs cannot both claim it. Returns
    /// whether this caller won the claim.
    async fn stamp_retry(
        &self,
        id: Uuid,
        observed_next_retry_at: Option<DateTime<Utc>>,
        last_retry_at: DateTime<Utc>,
        next_retry_at: Option<DateTime<Utc>>,
    ) -> Result<bool>;
}
