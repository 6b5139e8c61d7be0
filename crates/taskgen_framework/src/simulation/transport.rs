//! Remote service transport boundary.
//!
//! Adapters talk to their engine through this trait: named services with
//! request/reply semantics plus fire-and-forget topics. Payloads are
//! engine-schema JSON documents built by the adapter; the transport moves
//! them without interpreting them.
//!
//! A structured failure (`ServiceReply { success: false, .. }`) is part of
//! the normal outcome space. A [`TransportFault`] is the abnormal channel:
//! disconnects, protocol violations, and call deadlines.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportFault {
    #[error("call to `{service}` exceeded {timeout:?}")]
    Timeout { service: String, timeout: Duration },
    #[error("transport channel closed: {0}")]
    ChannelClosed(String),
    #[error("engine protocol error: {0}")]
    Protocol(String),
}

/// Structured result of one service call.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceReply {
    pub success: bool,
    /// Engine-provided failure reason, when available.
    pub status: Option<String>,
}

impl ServiceReply {
    pub fn ok() -> Self {
        Self {
            success: true,
            status: None,
        }
    }

    pub fn failed(status: impl Into<String>) -> Self {
        Self {
            success: false,
            status: Some(status.into()),
        }
    }
}

/// Asynchronous engine transport.
///
/// Callers issue one request and await its completion; the adapter layer
/// guarantees at most one in-flight call per operation kind per handle.
#[async_trait]
pub trait ServiceTransport: Send + Sync {
    /// Blocks until the named service reports available, bounded by
    /// `timeout`. Exceeding the bound is a [`TransportFault::Timeout`].
    async fn wait_for_service(
        &self,
        service: &str,
        timeout: Duration,
    ) -> Result<(), TransportFault>;

    /// Issues one request and awaits the structured reply.
    async fn call(&self, service: &str, payload: Value) -> Result<ServiceReply, TransportFault>;

    /// Fire-and-forget broadcast on a topic; no acknowledgement.
    async fn publish(&self, topic: &str, payload: Value) -> Result<(), TransportFault>;
}

/// Caps a service call with an explicit deadline so a hung engine surfaces
/// as a timeout fault instead of blocking the episode flow indefinitely.
pub(crate) async fn call_with_deadline(
    transport: &dyn ServiceTransport,
    service: &str,
    payload: Value,
    deadline: Duration,
) -> Result<ServiceReply, TransportFault> {
    match tokio::time::timeout(deadline, transport.call(service, payload)).await {
        Ok(result) => result,
        Err(_elapsed) => Err(TransportFault::Timeout {
            service: service.to_string(),
            timeout: deadline,
        }),
    }
}
