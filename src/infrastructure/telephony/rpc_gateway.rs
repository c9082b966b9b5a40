//! JSON-RPC client adapter for the voice provider
//!
//! The provider exposes a single `call.place` method that returns once the
//! call has completed or the provider-side timeout fired. The dispatcher
//! additionally bounds each invocation with its own timeout, so a hung
//! provider settles as a failed call rather than stalling a worker slot
//! forever.

use std::time::Duration;

use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::Deserialize;
use tracing::debug;

use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use crate::domain::telephony::{CallOutcome, OutboundCall, TelephonyGateway};

/// Wire reply of `call.place`.
#[derive(Debug, Deserialize)]
struct PlaceCallReply {
    outcome: String,
}

pub struct RpcTelephonyGateway {
    client: HttpClient,
}

impl RpcTelephonyGateway {
    /// Build a client for the provider endpoint. `request_timeout` should
    /// comfortably exceed the dispatcher's per-call timeout; the dispatcher
    /// is the one enforcing the real bound.
    pub fn connect(endpoint: &str, request_timeout: Duration) -> Result<Self> {
        let client = HttpClientBuilder::default()
            .request_timeout(request_timeout)
            .build(endpoint)
            .map_err(|e| {
                DomainError::Gateway(format!("failed to build gateway client: {}", e))
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TelephonyGateway for RpcTelephonyGateway {
    async fn place_call(&self, call: &OutboundCall) -> Result<CallOutcome> {
        debug!(phone = %call.phone_number, "Placing call via gateway");

        let reply: PlaceCallReply = self
            .client
            .request("call.place", rpc_params![call])
            .await
            .map_err(|e| DomainError::Gateway(e.to_string()))?;

        match reply.outcome.as_str() {
            "answered" => Ok(CallOutcome::Answered),
            // Some provider versions report "no_answer" instead.
            "not_answered" | "no_answer" => Ok(CallOutcome::NotAnswered),
            "failed" => Ok(CallOutcome::Failed),
            other => Err(DomainError::Gateway(format!(
                "unknown call outcome: {}",
                other
            ))),
        }
    }
}
