//! Adapter implementations for the gateway and notifier ports.

pub mod http;
pub mod memory;

mod retry;
mod tracing_notifier;

pub use http::{HttpGateway, HttpGatewayError};
pub use retry::{RetryPolicy, RetryingGateway};
pub use tracing_notifier::TracingNotifier;
