#![allow(dead_code)]
//! Shared test doubles and fixtures for the integration suites.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use uuid::Uuid;

use outdial::application::{
    DispatchRequest, Dispatcher, DispatcherSettings, RetryScheduler, SchedulerSettings,
};
use outdial::domain::call_record::{CallRecord, CallRecordRepository, CallStatus, RetryPolicy};
use outdial::domain::entitlement::StaticEntitlements;
use outdial::domain::shared::error::DomainError;
use outdial::domain::shared::result::Result;
use outdial::domain::telephony::{CallOutcome, OutboundCall, TelephonyGateway};
use outdial::infrastructure::persistence::memory::{
    InMemoryCallRecordRepository, InMemoryCampaignRepository,
};

/// Scripted gateway double that tracks concurrent entries, so tests can
/// observe the dispatcher's worker-pool bound.
pub struct FakeGateway {
    default_outcome: CallOutcome,
    scripted: Mutex<HashMap<String, CallOutcome>>,
    failing: Mutex<HashSet<String>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    total_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn with_default(outcome: CallOutcome) -> Self {
        Self {
            default_outcome: outcome,
            scripted: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            delay: Duration::from_millis(5),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            total_calls: AtomicUsize::new(0),
        }
    }

    pub fn answering() -> Self {
        Self::with_default(CallOutcome::Answered)
    }

    pub fn unanswered() -> Self {
        Self::with_default(CallOutcome::NotAnswered)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fix the outcome for one number.
    pub fn script(self, phone: &str, outcome: CallOutcome) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .insert(phone.to_string(), outcome);
        self
    }

    /// Make the gateway error for one number.
    pub fn fail_for(self, phone: &str) -> Self {
        self.failing.lock().unwrap().insert(phone.to_string());
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TelephonyGateway for FakeGateway {
    async fn place_call(&self, call: &OutboundCall) -> Result<CallOutcome> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.total_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(&call.phone_number) {
            return Err(DomainError::Gateway("provider rejected the call".into()));
        }
        let scripted = self
            .scripted
            .lock()
            .unwrap()
            .get(&call.phone_number)
            .copied();
        Ok(scripted.unwrap_or(self.default_outcome))
    }
}

/// Call record store decorator whose `create` fails for chosen numbers.
pub struct FlakyCallRecordStore {
    inner: Arc<InMemoryCallRecordRepository>,
    fail_numbers: HashSet<String>,
}

impl FlakyCallRecordStore {
    pub fn new(inner: Arc<InMemoryCallRecordRepository>, fail_numbers: &[&str]) -> Self {
        Self {
            inner,
            fail_numbers: fail_numbers.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl CallRecordRepository for FlakyCallRecordStore {
    async fn create(&self, record: &CallRecord) -> Result<()> {
        if self.fail_numbers.contains(&record.phone_number) {
            return Err(DomainError::Persistence("store unreachable".into()));
        }
        self.inner.create(record).await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<CallRecord>> {
        self.inner.get_by_id(id).await
    }

    async fn list_by_campaign(&self, campaign_id: Uuid) -> Result<Vec<CallRecord>> {
        self.inner.list_by_campaign(campaign_id).await
    }

    async fn list_due_for_retry(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<CallRecord>> {
        self.inner.list_due_for_retry(now, limit).await
    }

    async fn stamp_retry(
        &self,
        id: Uuid,
        observed_next_retry_at: Option<DateTime<Utc>>,
        last_retry_at: DateTime<Utc>,
        next_retry_at: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        self.inner
            .stamp_retry(id, observed_next_retry_at, last_retry_at, next_retry_at)
            .await
    }
}

/// Dispatcher wired to in-memory stores and a fake gateway.
pub struct Harness {
    pub dispatcher: Arc<Dispatcher>,
    pub campaigns: Arc<InMemoryCampaignRepository>,
    pub call_records: Arc<InMemoryCallRecordRepository>,
    pub gateway: Arc<FakeGateway>,
}

impl Harness {
    pub fn scheduler(&self) -> Arc<RetryScheduler> {
        Arc::new(RetryScheduler::new(
            self.dispatcher.clone(),
            self.call_records.clone(),
            self.campaigns.clone(),
            SchedulerSettings::default(),
        ))
    }
}

pub fn harness(gateway: FakeGateway) -> Harness {
    harness_with(gateway, StaticEntitlements::allow_all(), Duration::from_secs(5))
}

pub fn denied_harness(gateway: FakeGateway) -> Harness {
    harness_with(gateway, StaticEntitlements::deny_all(), Duration::from_secs(5))
}

pub fn harness_with_timeout(gateway: FakeGateway, call_timeout: Duration) -> Harness {
    harness_with(gateway, StaticEntitlements::allow_all(), call_timeout)
}

pub fn harness_with(
    gateway: FakeGateway,
    entitlements: StaticEntitlements,
    call_timeout: Duration,
) -> Harness {
    let campaigns = Arc::new(InMemoryCampaignRepository::new());
    let call_records = Arc::new(InMemoryCallRecordRepository::new());
    let gateway = Arc::new(gateway);
    let dispatcher = Arc::new(Dispatcher::new(
        campaigns.clone(),
        call_records.clone(),
        gateway.clone(),
        Arc::new(entitlements),
        DispatcherSettings { call_timeout },
    ));
    Harness {
        dispatcher,
        campaigns,
        call_records,
        gateway,
    }
}

/// A plain batch request with sane defaults.
pub fn request(user_id: Uuid, numbers: &[&str]) -> DispatchRequest {
    DispatchRequest {
        user_id,
        campaign_name: "Test Campaign".to_string(),
        prompt_id: Uuid::new_v4(),
        phone_numbers: numbers.iter().map(|s| s.to_string()).collect(),
        customer_names: HashMap::new(),
        concurrent_limit: 10,
        retry_policy: RetryPolicy::default(),
        lineage: None,
    }
}

pub fn retry_policy(interval_minutes: i32, max_attempts: i32) -> RetryPolicy {
    RetryPolicy {
        enabled: true,
        interval_minutes,
        max_attempts,
    }
}

/// An unanswered record created `minutes_ago`, carrying an explicit schedule
/// computed from its backdated creation time.
pub fn backdated_unanswered(
    campaign_id: Uuid,
    user_id: Uuid,
    phone: &str,
    policy: RetryPolicy,
    minutes_ago: i64,
) -> CallRecord {
    let mut record = CallRecord::new(
        campaign_id,
        user_id,
        phone.to_string(),
        None,
        policy,
        None,
    );
    record.created_at = Utc::now() - ChronoDuration::minutes(minutes_ago);
    record.settle(CallStatus::NotAnswered);
    record
}
