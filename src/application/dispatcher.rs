//! Batch call dispatcher
//!
//! Places the calls of one request concurrently under a bounded limit,
//! creates a call record per number, and keeps the owning campaign's
//! aggregate counters current. Validation and the entitlement check run
//! before any call is placed; after that point every failure is isolated to
//! its own number.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::call_record::{
    CallRecord, CallRecordRepository, CallStatus, RetryLineage, RetryPolicy,
};
use crate::domain::campaign::{Campaign, CampaignRepository};
use crate::domain::entitlement::EntitlementService;
use crate::domain::phone::{self, DialEntry};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::telephony::{OutboundCall, TelephonyGateway};

/// Concurrency applied when a request does not name its own limit.
pub const DEFAULT_CONCURRENT_LIMIT: usize = 10;

/// One unit of dialing work handed to the dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub user_id: Uuid,
    pub campaign_name: String,
    pub prompt_id: Uuid,
    pub phone_numbers: Vec<String>,
    /// Display names keyed by the raw phone string they were submitted with.
    pub customer_names: HashMap<String, String>,
    /// Maximum calls in flight for this request.
    pub concurrent_limit: usize,
    pub retry_policy: RetryPolicy,
    /// Present only when this request re-attempts a single earlier record.
    pub lineage: Option<RetryLineage>,
}

impl DispatchRequest {
    fn validate(&self) -> Result<()> {
        if self.campaign_name.trim().is_empty() {
            return Err(DomainError::Validation("campaign name is required".into()));
        }
        if self.phone_numbers.is_empty() {
            return Err(DomainError::Validation("phone number list is empty".into()));
        }
        if self.concurrent_limit == 0 {
            return Err(DomainError::Validation(
                "concurrent limit must be at least 1".into(),
            ));
        }
        self.retry_policy.validate()
    }
}

/// Summary returned to the caller once every number has settled.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub campaign_id: Uuid,
    pub successful_calls: u32,
    pub failed_calls: u32,
    pub call_record_ids: Vec<Uuid>,
    /// Numbers excluded by validation, reported rather than silently dropped.
    pub invalid_numbers: u32,
}

/// Settings applied to every request.
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    /// Hard bound on a single gateway interaction.
    pub call_timeout: Duration,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(300),
        }
    }
}

pub struct Dispatcher {
    campaigns: Arc<dyn CampaignRepository>,
    call_records: Arc<dyn CallRecordRepository>,
    gateway: Arc<dyn TelephonyGateway>,
    entitlements: Arc<dyn EntitlementService>,
    settings: DispatcherSettings,
}

/// How one number ended up, from the caller's point of view.
struct NumberOutcome {
    answered: bool,
    record_id: Option<Uuid>,
}

impl Dispatcher {
    pub fn new(
        campaigns: Arc<dyn CampaignRepository>,
        call_records: Arc<dyn CallRecordRepository>,
        gateway: Arc<dyn TelephonyGateway>,
        entitlements: Arc<dyn EntitlementService>,
        settings: DispatcherSettings,
    ) -> Self {
        Self {
            campaigns,
            call_records,
            gateway,
            entitlements,
            settings,
        }
    }

    /// Dispatch one request.
    ///
    /// Fails outright only before any call is placed: malformed request,
    /// missing entitlement, or zero valid numbers. Past that point each
    /// number settles independently and the result reports accurate counts
    /// even under partial failure.
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchResult> {
        request.validate()?;

        if !self.entitlements.can_place_calls(request.user_id).await? {
            return Err(DomainError::Unauthorized(
                "no active calling entitlement".into(),
            ));
        }

        let (valid, invalid) = phone::partition(&request.phone_numbers, &request.customer_names);
        if !invalid.is_empty() {
            warn!(
                count = invalid.len(),
                "Excluding invalid phone numbers from dispatch"
            );
        }
        if valid.is_empty() {
            return Err(DomainError::Validation(
                "no valid phone numbers in request".into(),
            ));
        }

        let campaign = self.resolve_campaign(&request, valid.len() as i32).await?;
        info!(
            campaign_id = %campaign.id,
            campaign_name = %campaign.campaign_name,
            numbers = valid.len(),
            limit = request.concurrent_limit,
            "Dispatching batch"
        );

        let started = Instant::now();

        // Bounded worker pool: at most `concurrent_limit` calls in flight,
        // the next queued number admitted as each one settles.
        let outcomes: Vec<NumberOutcome> = stream::iter(valid)
            .map(|entry| self.place_one(&request, &campaign, entry))
            .buffer_unordered(request.concurrent_limit)
            .collect()
            .await;

        let mut result = DispatchResult {
            campaign_id: campaign.id,
            successful_calls: 0,
            failed_calls: 0,
            call_record_ids: Vec::with_capacity(outcomes.len()),
            invalid_numbers: invalid.len() as u32,
        };
        for outcome in outcomes {
            if outcome.answered {
                result.successful_calls += 1;
            } else {
                result.failed_calls += 1;
            }
            if let Some(id) = outcome.record_id {
                result.call_record_ids.push(id);
            }
        }

        histogram!("dial_dispatch_duration_seconds").record(started.elapsed().as_secs_f64());
        info!(
            campaign_id = %campaign.id,
            successful = result.successful_calls,
            failed = result.failed_calls,
            "Batch dispatch complete"
        );
        Ok(result)
    }

    /// Reuse the user's campaign of the same name or create a fresh one.
    /// `total_numbers` grows by the batch size up front so settled counters
    /// can never overtake it.
    async fn resolve_campaign(
        &self,
        request: &DispatchRequest,
        valid_count: i32,
    ) -> Result<Campaign> {
        if let Some(mut existing) = self
            .campaigns
            .find_by_name(request.user_id, &request.campaign_name)
            .await?
        {
            self.campaigns.add_numbers(existing.id, valid_count).await?;
            existing.total_numbers += valid_count;
            debug!(campaign_id = %existing.id, added = valid_count, "Reusing campaign");
            return Ok(existing);
        }

        let campaign = Campaign::new(
            request.user_id,
            request.campaign_name.clone(),
            request.prompt_id,
            request.retry_policy,
            valid_count,
        );
        self.campaigns.create(&campaign).await?;
        debug!(campaign_id = %campaign.id, "Created campaign");
        Ok(campaign)
    }

    /// Dispatch a single number. Infallible by contract: every failure mode
    /// settles into a failed outcome so the rest of the batch continues.
    async fn place_one(
        &self,
        request: &DispatchRequest,
        campaign: &Campaign,
        entry: DialEntry,
    ) -> NumberOutcome {
        let call = OutboundCall {
            user_id: request.user_id,
            campaign_id: campaign.id,
            prompt_id: request.prompt_id,
            phone_number: entry.phone_number.clone(),
            customer_name: entry.customer_name.clone(),
        };

        let status =
            match tokio::time::timeout(self.settings.call_timeout, self.gateway.place_call(&call))
                .await
            {
                Ok(Ok(outcome)) => outcome.as_status(),
                Ok(Err(e)) => {
                    warn!(phone = %entry.phone_number, error = %e, "Gateway call failed");
                    CallStatus::Failed
                }
                Err(_) => {
                    warn!(
                        phone = %entry.phone_number,
                        timeout_secs = self.settings.call_timeout.as_secs(),
                        "Gateway call timed out"
                    );
                    CallStatus::Failed
                }
            };

        counter!("dial_calls_total", "outcome" => status.as_str()).increment(1);

        let mut record = CallRecord::new(
            campaign.id,
            request.user_id,
            entry.phone_number,
            entry.customer_name,
            request.retry_policy,
            request.lineage,
        );
        record.settle(status);

        let answered = status == CallStatus::Answered;
        if let Err(e) = self.call_records.create(&record).await {
            error!(phone = %record.phone_number, error = %e, "Failed to persist call record");
            return NumberOutcome {
                answered: false,
                record_id: None,
            };
        }

        if let Err(e) = self.campaigns.record_outcome(campaign.id, answered).await {
            error!(campaign_id = %campaign.id, error = %e, "Failed to update campaign counters");
        }

        NumberOutcome {
            answered,
            record_id: Some(record.id),
        }
    }
}
