//! Retry scheduler
//!
//! A recurring job that scans the call record store for attempts eligible
//! for another try and re-invokes the dispatcher once per eligible record,
//! carrying the retry lineage forward. Runs are idempotent: a record fires
//! once, then its stamp takes it out of the eligible set, and a conditional
//! update arbitrates between overlapping runs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future;
use futures::stream::{self, StreamExt};
use metrics::counter;
use tracing::{debug, error, info, warn};

use crate::domain::call_record::{CallRecord, CallRecordRepository, RetryLineage};
use crate::domain::campaign::CampaignRepository;
use crate::domain::shared::result::Result;

use super::dispatcher::{DispatchRequest, Dispatcher};

/// Settings for one scheduler instance.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Bounded parallelism across independent per-record retries.
    pub concurrency: usize,
    /// Upper bound on records examined per run.
    pub batch_limit: i64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            batch_limit: 500,
        }
    }
}

/// Outcome of one scheduler pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryRunReport {
    /// Records found eligible by the scan.
    pub eligible: usize,
    /// Retries actually initiated; records that failed along the way keep
    /// their schedule and are re-evaluated next run.
    pub retried: usize,
}

pub struct RetryScheduler {
    dispatcher: Arc<Dispatcher>,
    call_records: Arc<dyn CallRecordRepository>,
    campaigns: Arc<dyn CampaignRepository>,
    settings: SchedulerSettings,
}

impl RetryScheduler {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        call_records: Arc<dyn CallRecordRepository>,
        campaigns: Arc<dyn CampaignRepository>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            dispatcher,
            call_records,
            campaigns,
            settings,
        }
    }

    /// One scheduler pass over everything currently due.
    pub async fn run_once(&self) -> Result<RetryRunReport> {
        let now = Utc::now();
        let due = self
            .call_records
            .list_due_for_retry(now, self.settings.batch_limit)
            .await?;

        if due.is_empty() {
            debug!("No call records due for retry");
            return Ok(RetryRunReport::default());
        }
        if due.len() as i64 == self.settings.batch_limit {
            warn!(
                limit = self.settings.batch_limit,
                "Retry scan hit the batch limit; remaining records wait for the next run"
            );
        }

        let eligible = due.len();
        info!(eligible, "Processing due retries");

        // Each record's dispatch+stamp is an independent unit of work; a slow
        // one only occupies its own slot.
        let retried = stream::iter(due)
            .map(|record| self.retry_one(record, now))
            .buffer_unordered(self.settings.concurrency)
            .filter(|initiated| future::ready(*initiated))
            .count()
            .await;

        counter!("dial_retries_total").increment(retried as u64);
        info!(eligible, retried, "Retry pass complete");
        Ok(RetryRunReport { eligible, retried })
    }

    /// Re-dispatch one record. Returns whether a retry was initiated.
    ///
    /// Failures are isolated: a missing campaign or a failed dispatch leaves
    /// the record's schedule untouched so the next run re-evaluates it.
    async fn retry_one(&self, record: CallRecord, now: DateTime<Utc>) -> bool {
        let campaign = match self.campaigns.get_by_id(record.campaign_id).await {
            Ok(Some(campaign)) => campaign,
            Ok(None) => {
                warn!(
                    record_id = %record.id,
                    campaign_id = %record.campaign_id,
                    "Owning campaign missing; skipping record"
                );
                return false;
            }
            Err(e) => {
                error!(record_id = %record.id, error = %e, "Failed to load campaign; skipping record");
                return false;
            }
        };

        let attempt = record.retry_count + 1;
        debug!(
            record_id = %record.id,
            phone = %record.phone_number,
            attempt,
            max = record.max_retry_attempts,
            "Retrying call"
        );

        let customer_names: HashMap<String, String> = record
            .customer_name
            .clone()
            .map(|name| HashMap::from([(record.phone_number.clone(), name)]))
            .unwrap_or_default();

        let request = DispatchRequest {
            user_id: record.user_id,
            campaign_name: format!("{} (Auto Retry {})", campaign.campaign_name, attempt),
            prompt_id: campaign.prompt_id,
            phone_numbers: vec![record.phone_number.clone()],
            customer_names,
            concurrent_limit: 1,
            retry_policy: record.policy(),
            lineage: Some(RetryLineage {
                parent_call_id: record.id,
                retry_count: attempt,
            }),
        };

        if let Err(e) = self.dispatcher.dispatch(request).await {
            warn!(
                record_id = %record.id,
                error = %e,
                "Retry dispatch failed; schedule left for next run"
            );
            return false;
        }

        // Conditional stamp: only lands if no concurrent run claimed the
        // record between our scan and now.
        let (last_retry_at, next_retry_at) = record.retry_stamp(now);
        match self
            .call_records
            .stamp_retry(record.id, record.next_retry_at, last_retry_at, next_retry_at)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(record_id = %record.id, "Retry stamp lost to a concurrent run")
            }
            Err(e) => {
                error!(record_id = %record.id, error = %e, "Failed to stamp retried record")
            }
        }

        true
    }
}
