//! Bounded retry and timeout decorator for record gateways.

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::pipeline::{
    domain::ResourceName,
    ports::{GatewayOperation, GatewayResult, RecordGateway, RemoteError, RemoteErrorKind},
};

/// Retry, backoff, and timeout settings for gateway calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first. Zero behaves as one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    pub base_backoff: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
    /// Time budget of a single attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Returns a policy that makes exactly one attempt.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Returns the delay after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1_u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Gateway decorator adding per-attempt timeouts and exponential backoff.
///
/// Only transient failures of idempotent operations are retried, so a
/// `create` is attempted once even when it times out.
#[derive(Debug, Clone)]
pub struct RetryingGateway<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G> RetryingGateway<G>
where
    G: RecordGateway,
{
    /// Wraps `inner` with `policy`.
    #[must_use]
    pub const fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns the wrapped gateway.
    #[must_use]
    pub const fn inner(&self) -> &G {
        &self.inner
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    async fn run<T, F, Fut>(
        &self,
        operation: GatewayOperation,
        resource: &ResourceName,
        mut call: F,
    ) -> GatewayResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = GatewayResult<T>> + Send,
        T: Send,
    {
        let limit = self.policy.attempt_timeout;
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            let outcome = tokio::time::timeout(limit, call()).await.unwrap_or_else(|_| {
                Err(RemoteError::new(
                    resource.clone(),
                    operation,
                    RemoteErrorKind::Timeout(limit),
                ))
            });
            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.backoff_for(attempt);
                    tracing::warn!(
                        %resource,
                        %operation,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "gateway call failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl<G> RecordGateway for RetryingGateway<G>
where
    G: RecordGateway,
{
    async fn list(&self, resource: &ResourceName) -> GatewayResult<Vec<Value>> {
        let inner = &self.inner;
        self.run(GatewayOperation::List, resource, move || inner.list(resource))
            .await
    }

    async fn get(&self, resource: &ResourceName, id: u64) -> GatewayResult<Value> {
        let inner = &self.inner;
        self.run(GatewayOperation::Get, resource, move || inner.get(resource, id))
            .await
    }

    async fn create(&self, resource: &ResourceName, fields: &Value) -> GatewayResult<Value> {
        let inner = &self.inner;
        self.run(GatewayOperation::Create, resource, move || {
            inner.create(resource, fields)
        })
        .await
    }

    async fn update(
        &self,
        resource: &ResourceName,
        id: u64,
        record: &Value,
    ) -> GatewayResult<Value> {
        let inner = &self.inner;
        self.run(GatewayOperation::Update, resource, move || {
            inner.update(resource, id, record)
        })
        .await
    }

    async fn delete(&self, resource: &ResourceName, id: u64) -> GatewayResult<()> {
        let inner = &self.inner;
        self.run(GatewayOperation::Delete, resource, move || {
            inner.delete(resource, id)
        })
        .await
    }
}
