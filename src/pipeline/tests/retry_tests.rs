//! Retrying gateway tests.

use crate::pipeline::{
    adapters::{RetryPolicy, RetryingGateway, memory::InMemoryGateway},
    domain::ResourceName,
    ports::{GatewayOperation, GatewayResult, RecordGateway, RemoteErrorKind},
};
use async_trait::async_trait;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

#[fixture]
fn policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
        attempt_timeout: Duration::from_secs(5),
    }
}

fn resource() -> ResourceName {
    ResourceName::sales_pipeline()
}

fn count(gateway: &InMemoryGateway, operation: GatewayOperation) -> usize {
    gateway.calls_of(operation).expect("calls").len()
}

#[rstest]
#[case(1, Duration::from_millis(200))]
#[case(2, Duration::from_millis(400))]
#[case(3, Duration::from_millis(800))]
#[case(5, Duration::from_secs(2))]
#[case(40, Duration::from_secs(2))]
fn backoff_doubles_up_to_the_cap(#[case] attempt: u32, #[case] expected: Duration) {
    assert_eq!(RetryPolicy::default().backoff_for(attempt), expected);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transient_failures_are_retried(policy: RetryPolicy) {
    let inner = InMemoryGateway::new();
    inner
        .seed(&resource(), vec![json!({"id": 1, "etapa": "INBOX"})])
        .expect("seed");
    inner
        .fail_next(GatewayOperation::List, RemoteErrorKind::Transport("reset".to_owned()))
        .expect("queue");
    inner
        .fail_next(
            GatewayOperation::List,
            RemoteErrorKind::Status {
                code: 503,
                body: String::new(),
            },
        )
        .expect("queue");
    let gateway = RetryingGateway::new(inner.clone(), policy);

    let records = gateway.list(&resource()).await.expect("third attempt should succeed");

    assert_eq!(records.len(), 1);
    assert_eq!(count(&inner, GatewayOperation::List), 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retries_stop_at_the_policy_bound(policy: RetryPolicy) {
    let inner = InMemoryGateway::new();
    for _ in 0..5 {
        inner
            .fail_next(GatewayOperation::Update, RemoteErrorKind::Status { code: 429, body: String::new() })
            .expect("queue");
    }
    let gateway = RetryingGateway::new(inner.clone(), policy);

    let result = gateway.update(&resource(), 1, &json!({"id": 1})).await;

    let err = result.expect_err("every attempt fails");
    assert_eq!(err.operation, GatewayOperation::Update);
    assert_eq!(count(&inner, GatewayOperation::Update), 3);
}

#[rstest]
#[case(RemoteErrorKind::Status { code: 404, body: String::new() })]
#[case(RemoteErrorKind::NotFound(1))]
#[case(RemoteErrorKind::MalformedPayload("truncated".to_owned()))]
#[tokio::test(flavor = "multi_thread")]
async fn permanent_failures_are_not_retried(policy: RetryPolicy, #[case] kind: RemoteErrorKind) {
    let inner = InMemoryGateway::new();
    inner.fail_next(GatewayOperation::Get, kind.clone()).expect("queue");
    let gateway = RetryingGateway::new(inner.clone(), policy);

    let err = gateway.get(&resource(), 1).await.expect_err("call fails");

    assert_eq!(err.kind, kind);
    assert_eq!(count(&inner, GatewayOperation::Get), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_is_never_retried(policy: RetryPolicy) {
    let inner = InMemoryGateway::new();
    inner
        .fail_next(GatewayOperation::Create, RemoteErrorKind::Timeout(Duration::from_secs(1)))
        .expect("queue");
    let gateway = RetryingGateway::new(inner.clone(), policy);

    let result = gateway.create(&resource(), &json!({"titulo": "Demo"})).await;

    assert!(result.is_err());
    assert_eq!(count(&inner, GatewayOperation::Create), 1);
}

/// Gateway whose `list` never answers in time.
#[derive(Default)]
struct StalledGateway {
    attempts: AtomicUsize,
}

#[async_trait]
impl RecordGateway for StalledGateway {
    async fn list(&self, _resource: &ResourceName) -> GatewayResult<Vec<Value>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }

    async fn get(&self, _resource: &ResourceName, _id: u64) -> GatewayResult<Value> {
        Ok(Value::Null)
    }

    async fn create(&self, _resource: &ResourceName, fields: &Value) -> GatewayResult<Value> {
        Ok(fields.clone())
    }

    async fn update(&self, _resource: &ResourceName, _id: u64, record: &Value) -> GatewayResult<Value> {
        Ok(record.clone())
    }

    async fn delete(&self, _resource: &ResourceName, _id: u64) -> GatewayResult<()> {
        Ok(())
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn slow_attempts_time_out_and_retry() {
    let policy = RetryPolicy {
        max_attempts: 2,
        base_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(1),
        attempt_timeout: Duration::from_millis(20),
    };
    let gateway = RetryingGateway::new(StalledGateway::default(), policy);

    let err = gateway.list(&resource()).await.expect_err("every attempt stalls");

    assert_eq!(err.kind, RemoteErrorKind::Timeout(Duration::from_millis(20)));
    assert_eq!(gateway.inner().attempts.load(Ordering::SeqCst), 2);
}
