//! In-memory record store for pipeline tests and demos.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::pipeline::{
    domain::ResourceName,
    ports::{GatewayOperation, GatewayResult, RecordGateway, RemoteError, RemoteErrorKind},
};

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCall {
    /// Operation invoked.
    pub operation: GatewayOperation,
    /// Resource targeted.
    pub resource: ResourceName,
    /// Record identifier, for single-record operations.
    pub id: Option<u64>,
    /// Body sent, for `create` and `update`.
    pub body: Option<Value>,
}

/// Thread-safe in-memory record store.
///
/// Identifiers are assigned from a single increasing counter and never
/// reused. Failures can be queued per operation to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    resources: HashMap<ResourceName, BTreeMap<u64, Value>>,
    last_id: u64,
    failures: HashMap<GatewayOperation, VecDeque<RemoteErrorKind>>,
    calls: Vec<GatewayCall>,
}

fn lock_error(resource: &ResourceName, operation: GatewayOperation) -> RemoteError {
    RemoteError::new(
        resource.clone(),
        operation,
        RemoteErrorKind::Transport("in-memory store lock poisoned".to_owned()),
    )
}

fn with_id(mut record: Value, id: u64) -> Value {
    if let Some(object) = record.as_object_mut() {
        object.insert("id".to_owned(), Value::from(id));
    }
    record
}

impl InMemoryGatewayState {
    fn begin(
        &mut self,
        operation: GatewayOperation,
        resource: &ResourceName,
        id: Option<u64>,
        body: Option<&Value>,
    ) -> GatewayResult<()> {
        self.calls.push(GatewayCall {
            operation,
            resource: resource.clone(),
            id,
            body: body.cloned(),
        });
        let queued = self
            .failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);
        match queued {
            Some(kind) => Err(RemoteError::new(resource.clone(), operation, kind)),
            None => Ok(()),
        }
    }

    fn allocate_id(&mut self) -> u64 {
        self.last_id = self.last_id.saturating_add(1);
        self.last_id
    }
}

impl InMemoryGateway {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts records as if they had been created earlier.
    ///
    /// Records carrying a numeric `id` keep it; others get a fresh one.
    /// Returns the identifiers in input order.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when lock acquisition fails.
    pub fn seed(
        &self,
        resource: &ResourceName,
        records: impl IntoIterator<Item = Value>,
    ) -> GatewayResult<Vec<u64>> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_error(resource, GatewayOperation::Create))?;
        let mut ids = Vec::new();
        for record in records {
            let id = match record.get("id").and_then(Value::as_u64) {
                Some(existing) => {
                    state.last_id = state.last_id.max(existing);
                    existing
                }
                None => state.allocate_id(),
            };
            state
                .resources
                .entry(resource.clone())
                .or_default()
                .insert(id, with_id(record, id));
            ids.push(id);
        }
        Ok(ids)
    }

    /// Queues a failure for the next call of `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when lock acquisition fails.
    pub fn fail_next(
        &self,
        operation: GatewayOperation,
        kind: RemoteErrorKind,
    ) -> GatewayResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_error(&ResourceName::new(""), operation))?;
        state.failures.entry(operation).or_default().push_back(kind);
        Ok(())
    }

    /// Returns every call made so far, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when lock acquisition fails.
    pub fn calls(&self) -> GatewayResult<Vec<GatewayCall>> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_error(&ResourceName::new(""), GatewayOperation::List))?;
        Ok(state.calls.clone())
    }

    /// Returns the calls of one operation.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when lock acquisition fails.
    pub fn calls_of(&self, operation: GatewayOperation) -> GatewayResult<Vec<GatewayCall>> {
        Ok(self
            .calls()?
            .into_iter()
            .filter(|call| call.operation == operation)
            .collect())
    }

    /// Returns a stored record without recording a call.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when lock acquisition fails.
    pub fn peek(&self, resource: &ResourceName, id: u64) -> GatewayResult<Option<Value>> {
        let state = self
            .state
            .read()
            .map_err(|_| lock_error(resource, GatewayOperation::Get))?;
        Ok(state
            .resources
            .get(resource)
            .and_then(|records| records.get(&id))
            .cloned())
    }
}

#[async_trait]
impl RecordGateway for InMemoryGateway {
    async fn list(&self, resource: &ResourceName) -> GatewayResult<Vec<Value>> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_error(resource, GatewayOperation::List))?;
        state.begin(GatewayOperation::List, resource, None, None)?;
        Ok(state
            .resources
            .get(resource)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get(&self, resource: &ResourceName, id: u64) -> GatewayResult<Value> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_error(resource, GatewayOperation::Get))?;
        state.begin(GatewayOperation::Get, resource, Some(id), None)?;
        state
            .resources
            .get(resource)
            .and_then(|records| records.get(&id))
            .cloned()
            .ok_or_else(|| {
                RemoteError::new(
                    resource.clone(),
                    GatewayOperation::Get,
                    RemoteErrorKind::NotFound(id),
                )
            })
    }

    async fn create(&self, resource: &ResourceName, fields: &Value) -> GatewayResult<Value> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_error(resource, GatewayOperation::Create))?;
        state.begin(GatewayOperation::Create, resource, None, Some(fields))?;
        if !fields.is_object() {
            return Err(RemoteError::new(
                resource.clone(),
                GatewayOperation::Create,
                RemoteErrorKind::Status {
                    code: 400,
                    body: "record must be a JSON object".to_owned(),
                },
            ));
        }
        let id = state.allocate_id();
        let record = with_id(fields.clone(), id);
        state
            .resources
            .entry(resource.clone())
            .or_default()
            .insert(id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        resource: &ResourceName,
        id: u64,
        record: &Value,
    ) -> GatewayResult<Value> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_error(resource, GatewayOperation::Update))?;
        state.begin(GatewayOperation::Update, resource, Some(id), Some(record))?;
        let stored = state
            .resources
            .get_mut(resource)
            .and_then(|records| records.get_mut(&id))
            .ok_or_else(|| {
                RemoteError::new(
                    resource.clone(),
                    GatewayOperation::Update,
                    RemoteErrorKind::NotFound(id),
                )
            })?;
        *stored = with_id(record.clone(), id);
        Ok(stored.clone())
    }

    async fn delete(&self, resource: &ResourceName, id: u64) -> GatewayResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_error(resource, GatewayOperation::Delete))?;
        state.begin(GatewayOperation::Delete, resource, Some(id), None)?;
        state
            .resources
            .get_mut(resource)
            .and_then(|records| records.remove(&id))
            .map(|_| ())
            .ok_or_else(|| {
                RemoteError::new(
                    resource.clone(),
                    GatewayOperation::Delete,
                    RemoteErrorKind::NotFound(id),
                )
            })
    }
}
