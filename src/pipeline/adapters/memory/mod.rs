//! In-memory adapters for tests and local runs.

mod gateway;
mod notifier;

pub use gateway::{GatewayCall, InMemoryGateway};
pub use notifier::RecordingNotifier;
