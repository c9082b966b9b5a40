//! Campaign domain model
//!
//! A campaign is a named batch of call attempts sharing a prompt and a retry
//! policy. Aggregate counters are advanced as individual records settle and
//! never exceed the number of dispatched targets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::call_record::RetryPolicy;
use super::shared::result::Result;

/// A named unit of dialing work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub user_id: Uuid,
    pub campaign_name: String,
    /// Message template handed to the telephony gateway.
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

impl Campaign {
    pub fn new(
        user_id: Uuid,
        campaign_name: String,
        prompt_id: Uuid,
        policy: RetryPolicy,
        total_numbers: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            campaign_name,
            prompt_id,
            retry_enabled: policy.enabled,
            retry_interval_minutes: policy.interval_minutes,
            max_retry_attempts: policy.max_attempts,
            successful_calls: 0,
            failed_calls: 0,
            total_numbers,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            enabled: self.retry_enabled,
            interval_minutes: self.retry_interval_minutes,
            max_attempts: self.max_retry_attempts,
        }
    }

    /// Count of records that have settled into either counter.
    pub fn settled_calls(&self) -> i32 {
        self.successful_calls + self.failed_calls
    }
}

/// Campaign store operations used by the dispatcher and the scheduler.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Persist a new campaign.
    async fn create(&self, campaign: &Campaign) -> Result<()>;

    /// Fetch a campaign by id.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Campaign>>;

    /// Most recent campaign with this name owned by the user.
    async fn find_by_name(&self, user_id: Uuid, campaign_name: &str) -> Result<Option<Campaign>>;

    /// Grow `total_numbers` when another batch lands in an existing campaign.
    async fn add_numbers(&self, id: Uuid, count: i32) -> Result<()>;

    /// Attribute one settled record to exactly one aggregate counter.
    async fn record_outcome(&self, id: Uuid, answered: bool) -> Result<()>;
}
