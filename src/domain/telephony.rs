//! Telephony gateway port
//!
//! The gateway performs one call and reports how it ended. Its internals
//! (signaling, speech synthesis, recognition) are an external capability;
//! the dispatcher treats `place_call` as an opaque, long-running operation
//! and bounds it with a timeout.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::call_record::CallStatus;
use super::shared::result::Result;

/// Parameters for one outbound call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundCall {
    pub user_id: Uuid,
    pub campaign_id: Uuid,
    pub prompt_id: Uuid,
    pub phone_number: String,
    pub customer_name: Option<String>,
}

/// How a completed gateway interaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Answered,
    NotAnswered,
    Failed,
}

impl CallOutcome {
    pub fn as_status(self) -> CallStatus {
        match self {
            CallOutcome::Answered => CallStatus::Answered,
            CallOutcome::NotAnswered => CallStatus::NotAnswered,
            CallOutcome::Failed => CallStatus::Failed,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TelephonyGateway: Send + Sync {
    /// Place one call and wait for its outcome. May suspend for the duration
    /// of the telephony interaction (seconds to minutes).
    async fn place_call(&self, call: &OutboundCall) -> Result<CallOutcome>;
}
