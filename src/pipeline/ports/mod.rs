//! Port contracts for the pipeline engine.
//!
//! Ports define infrastructure-agnostic interfaces used by pipeline services.

pub mod gateway;
pub mod notifier;

#[cfg(test)]
pub use gateway::MockRecordGateway;
pub use gateway::{GatewayOperation, GatewayResult, RecordGateway, RemoteError, RemoteErrorKind};
pub use notifier::{MutationAction, Notification, NotificationLevel, Notifier};
