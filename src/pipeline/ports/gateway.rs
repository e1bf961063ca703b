//! Gateway port over the remote record store.

use crate::pipeline::domain::ResourceName;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, RemoteError>;

/// Uniform CRUD contract over a record store.
///
/// Records are JSON objects. `update` has full-document semantics: callers
/// merge their edits into the complete record before calling it. `list`
/// always returns the complete, unpaginated set. Implementations perform no
/// retries of their own; see
/// [`RetryingGateway`](crate::pipeline::adapters::RetryingGateway).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// Returns every record of `resource`.
    async fn list(&self, resource: &ResourceName) -> GatewayResult<Vec<Value>>;

    /// Returns one record.
    async fn get(&self, resource: &ResourceName, id: u64) -> GatewayResult<Value>;

    /// Creates a record and returns it as stored, including its new id.
    async fn create(&self, resource: &ResourceName, fields: &Value) -> GatewayResult<Value>;

    /// Replaces a record with `record` and returns it as stored.
    async fn update(&self, resource: &ResourceName, id: u64, record: &Value)
    -> GatewayResult<Value>;

    /// Permanently removes a record.
    async fn delete(&self, resource: &ResourceName, id: u64) -> GatewayResult<()>;
}

/// Gateway operation names, used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    /// `list`.
    List,
    /// `get`.
    Get,
    /// `create`.
    Create,
    /// `update`.
    Update,
    /// `delete`.
    Delete,
}

impl GatewayOperation {
    /// Returns the operation name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Returns whether repeating the operation cannot duplicate effects.
    #[must_use]
    pub const fn is_idempotent(self) -> bool {
        !matches!(self, Self::Create)
    }
}

impl fmt::Display for GatewayOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong in a failed gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// The store answered with a non-success status.
    Status {
        /// HTTP status code.
        code: u16,
        /// Response body, possibly empty.
        body: String,
    },
    /// The request never produced a response.
    Transport(String),
    /// The call exceeded its time budget.
    Timeout(Duration),
    /// The response body could not be decoded.
    MalformedPayload(String),
    /// No record has the requested identifier.
    NotFound(u64),
}

impl RemoteErrorKind {
    /// Returns whether a later attempt may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { code, .. } => matches!(*code, 408 | 429 | 500..=599),
            Self::MalformedPayload(_) | Self::NotFound(_) => false,
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { code, body } if body.is_empty() => write!(f, "status {code}"),
            Self::Status { code, body } => write!(f, "status {code}: {body}"),
            Self::Transport(reason) => write!(f, "transport error: {reason}"),
            Self::Timeout(limit) => write!(f, "timed out after {}ms", limit.as_millis()),
            Self::MalformedPayload(reason) => write!(f, "malformed payload: {reason}"),
            Self::NotFound(id) => write!(f, "record {id} not found"),
        }
    }
}

/// Failure of a gateway call, naming the resource and operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} {resource} failed: {kind}")]
pub struct RemoteError {
    /// Resource the call targeted.
    pub resource: ResourceName,
    /// Operation that failed.
    pub operation: GatewayOperation,
    /// Failure detail.
    pub kind: RemoteErrorKind,
}

impl RemoteError {
    /// Creates a remote error.
    #[must_use]
    pub const fn new(
        resource: ResourceName,
        operation: GatewayOperation,
        kind: RemoteErrorKind,
    ) -> Self {
        Self {
            resource,
            operation,
            kind,
        }
    }

    /// Returns whether retrying the call may help.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.operation.is_idempotent() && self.kind.is_transient()
    }
}
