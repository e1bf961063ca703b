//! Salesboard: sales pipeline board engine.
//!
//! Opportunities ("tasks") move through a fixed sequence of sales stages,
//! carry stage-specific tags and due dates, and are moved between stages by
//! drag and drop. A remote record store is the system of record.
//!
//! # Architecture
//!
//! Salesboard follows hexagonal architecture principles:
//!
//! - **Domain**: stage registry, task entity, wire format
//! - **Ports**: record gateway and notifier traits
//! - **Adapters**: HTTP, in-memory, and retrying gateways
//! - **Services**: mutation coordinator and editing surfaces
//! - **Board**: columns, drop zones, and the drag protocol
//!
//! # Modules
//!
//! - [`pipeline`]: the board engine
//! - [`config`]: layered configuration for the operator binary
//! - [`telemetry`]: tracing subscriber set-up

pub mod config;
pub mod pipeline;
pub mod telemetry;
