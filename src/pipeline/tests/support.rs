//! Shared fixtures for pipeline unit tests.

use crate::pipeline::{
    adapters::memory::{InMemoryGateway, RecordingNotifier},
    domain::ResourceName,
    services::MutationCoordinator,
};
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use rstest::fixture;
use serde_json::{Value, json};
use std::sync::Arc;

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Instant every fixed clock in these tests reads.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0)
        .single()
        .expect("valid fixed instant")
}

/// Coordinator over in-memory adapters.
pub type MemoryCoordinator = MutationCoordinator<InMemoryGateway, RecordingNotifier, FixedClock>;

/// In-memory collaborators plus a coordinator wired to them.
pub struct Harness {
    pub gateway: Arc<InMemoryGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub coordinator: MemoryCoordinator,
}

impl Harness {
    pub fn seed(&self, records: impl IntoIterator<Item = Value>) -> Vec<u64> {
        self.gateway
            .seed(&ResourceName::sales_pipeline(), records)
            .expect("seeding should succeed")
    }

    pub fn stored(&self, id: u64) -> Value {
        self.gateway
            .peek(&ResourceName::sales_pipeline(), id)
            .expect("peek should succeed")
            .expect("record should exist")
    }
}

#[fixture]
pub fn harness() -> Harness {
    let gateway = Arc::new(InMemoryGateway::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let coordinator = MutationCoordinator::new(
        Arc::clone(&gateway),
        Arc::clone(&notifier),
        Arc::new(FixedClock(now())),
    );
    Harness {
        gateway,
        notifier,
        coordinator,
    }
}

/// Store record for a task in `stage`.
pub fn record(id: u64, title: &str, stage: &str) -> Value {
    json!({
        "id": id,
        "titulo": title,
        "descripcion": "",
        "etapa": stage,
        "etiquetas": [],
        "fecha_vencimiento": null,
        "fecha_creacion": "2025-03-01T09:00:00Z",
        "prioridad": "media",
        "checklist": [],
        "deleted": false
    })
}
