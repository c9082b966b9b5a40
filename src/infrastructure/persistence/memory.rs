//! In-memory stores
//!
//! Used by the test suites and by database-less builds. Semantics match the
//! PostgreSQL repositories, including the conditional retry stamp.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::call_record::{CallRecord, CallRecordRepository};
use crate::domain::campaign::{Campaign, CampaignRepository};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;

#[derive(Default)]
pub struct InMemoryCampaignRepository {
    campaigns: Mutex<HashMap<Uuid, Campaign>>,
}

impl InMemoryCampaignRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignRepository for InMemoryCampaignRepository {
    async fn create(&self, campaign: &Campaign) -> Result<()> {
        self.campaigns
            .lock()
            .unwrap()
            .insert(campaign.id, campaign.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Campaign>> {
        Ok(self.campaigns.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_name(&self, user_id: Uuid, campaign_name: &str) -> Result<Option<Campaign>> {
        let campaigns = self.campaigns.lock().unwrap();
        let found = campaigns
            .values()
            .filter(|c| c.user_id == user_id && c.campaign_name == campaign_name)
            .max_by_key(|c| c.created_at)
            .cloned();
        Ok(found)
    }

    async fn add_numbers(&self, id: Uuid, count: i32) -> Result<()> {
        let mut campaigns = self.campaigns.lock().unwrap();
        let campaign = campaigns
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("campaign {}", id)))?;
        campaign.total_numbers += count;
        campaign.updated_at = Utc::now();
        Ok(())
    }

    async fn record_outcome(&self, id: Uuid, answered: bool) -> Result<()> {
        let mut campaigns = self.campaigns.lock().unwrap();
        let campaign = campaigns
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound(format!("campaign {}", id)))?;
        if answered {
            campaign.successful_calls += 1;
        } else {
            campaign.failed_calls += 1;
        }
        campaign.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCallRecordRepository {
    records: Mutex<HashMap<Uuid, CallRecord>>,
}

impl InMemoryCallRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the dispatcher. Test helper.
    pub fn insert(&self, record: CallRecord) {
        self.records.lock().unwrap().insert(record.id, record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl CallRecordRepository for InMemoryCallRecordRepository {
    async fn create(&self, record: &CallRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .insert(record.id, record.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<CallRecord>> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn list_by_campaign(&self, campaign_id: Uuid) -> Result<Vec<CallRecord>> {
        let records = self.records.lock().unwrap();
        let mut found: Vec<CallRecord> = records
            .values()
            .filter(|r| r.campaign_id == campaign_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        Ok(found)
    }

    async fn list_due_for_retry(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<CallRecord>> {
        let records = self.records.lock().unwrap();
        let mut due: Vec<CallRecord> = records
            .values()
            .filter(|r| r.is_due_for_retry(now))
            .cloned()
            .collect();
        // Explicit schedules first, oldest due first; unscheduled last.
        due.sort_by_key(|r| (r.next_retry_at.is_none(), r.next_retry_at));
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn stamp_retry(
        &self,
        id: Uuid,
        observed_next_retry_at: Option<DateTime<Utc>>,
        last_retry_at: DateTime<Utc>,
        next_retry_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let mut records = self.records.lock().unwrap();
        let record = match records.get_mut(&id) {
            Some(record) => record,
            None => return Ok(false),
        };
        if record.last_retry_at.is_some() || record.next_retry_at != observed_next_retry_at {
            return Ok(false);
        }
        record.last_retry_at = Some(last_retry_at);
        record.next_retry_at = next_retry_at;
        Ok(true)
    }
}
