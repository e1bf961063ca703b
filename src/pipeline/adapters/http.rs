//! HTTP adapter for the record gateway.
//!
//! Wire contract, JSON bodies throughout:
//!
//! | Operation | Request |
//! |---|---|
//! | list | `GET /{resource}` |
//! | get | `GET /{resource}/{id}` |
//! | create | `POST /{resource}` |
//! | update | `PUT /{resource}/{id}` with the full record |
//! | delete | `DELETE /{resource}/{id}` |

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

use crate::pipeline::{
    domain::ResourceName,
    ports::{GatewayOperation, GatewayResult, RecordGateway, RemoteError, RemoteErrorKind},
};

/// Errors raised while constructing an [`HttpGateway`].
#[derive(Debug, Error)]
pub enum HttpGatewayError {
    /// The base URL is not an absolute http(s) URL.
    #[error("invalid record store url '{url}': {reason}")]
    InvalidBaseUrl {
        /// URL as configured.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Record gateway speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpGateway {
    /// Creates a gateway rooted at `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HttpGatewayError::InvalidBaseUrl`] for URLs that do not
    /// parse or are not http(s), and [`HttpGatewayError::Client`] when the
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HttpGatewayError> {
        let parsed = Url::parse(base_url).map_err(|err| HttpGatewayError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HttpGatewayError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout,
        })
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, resource: &ResourceName) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    fn record_url(&self, resource: &ResourceName, id: u64) -> String {
        format!("{}/{}/{id}", self.base_url, resource)
    }

    async fn send(
        &self,
        operation: GatewayOperation,
        resource: &ResourceName,
        request: RequestBuilder,
    ) -> GatewayResult<Response> {
        let response = request.send().await.map_err(|err| {
            let kind = if err.is_timeout() {
                RemoteErrorKind::Timeout(self.timeout)
            } else {
                RemoteErrorKind::Transport(err.to_string())
            };
            RemoteError::new(resource.clone(), operation, kind)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(%resource, %operation, status = status.as_u16(), "record store rejected request");
        Err(RemoteError::new(
            resource.clone(),
            operation,
            RemoteErrorKind::Status {
                code: status.as_u16(),
                body: body.trim().to_owned(),
            },
        ))
    }

    async fn read_json(
        operation: GatewayOperation,
        resource: &ResourceName,
        response: Response,
    ) -> GatewayResult<Value> {
        let bytes = response.bytes().await.map_err(|err| {
            RemoteError::new(
                resource.clone(),
                operation,
                RemoteErrorKind::Transport(err.to_string()),
            )
        })?;
        serde_json::from_slice(&bytes).map_err(|err| {
            RemoteError::new(
                resource.clone(),
                operation,
                RemoteErrorKind::MalformedPayload(err.to_string()),
            )
        })
    }

    async fn read_object(
        operation: GatewayOperation,
        resource: &ResourceName,
        response: Response,
    ) -> GatewayResult<Value> {
        let value = Self::read_json(operation, resource, response).await?;
        if value.is_object() {
            Ok(value)
        } else {
            Err(RemoteError::new(
                resource.clone(),
                operation,
                RemoteErrorKind::MalformedPayload("expected a JSON object".to_owned()),
            ))
        }
    }
}

#[async_trait]
impl RecordGateway for HttpGateway {
    #[instrument(name = "gateway_list", skip(self), fields(resource = %resource))]
    async fn list(&self, resource: &ResourceName) -> GatewayResult<Vec<Value>> {
        let operation = GatewayOperation::List;
        let request = self.client.get(self.collection_url(resource));
        let response = self.send(operation, resource, request).await?;
        match Self::read_json(operation, resource, response).await? {
            Value::Array(records) => Ok(records),
            _ => Err(RemoteError::new(
                resource.clone(),
                operation,
                RemoteErrorKind::MalformedPayload("expected a JSON array".to_owned()),
            )),
        }
    }

    #[instrument(name = "gateway_get", skip(self), fields(resource = %resource))]
    async fn get(&self, resource: &ResourceName, id: u64) -> GatewayResult<Value> {
        let operation = GatewayOperation::Get;
        let request = self.client.get(self.record_url(resource, id));
        let response = self.send(operation, resource, request).await?;
        Self::read_object(operation, resource, response).await
    }

    #[instrument(name = "gateway_create", skip(self, payload), fields(resource = %resource))]
    async fn create(&self, resource: &ResourceName, payload: &Value) -> GatewayResult<Value> {
        let operation = GatewayOperation::Create;
        let request = self.client.post(self.collection_url(resource)).json(payload);
        let response = self.send(operation, resource, request).await?;
        Self::read_object(operation, resource, response).await
    }

    #[instrument(name = "gateway_update", skip(self, record), fields(resource = %resource))]
    async fn update(
        &self,
        resource: &ResourceName,
        id: u64,
        record: &Value,
    ) -> GatewayResult<Value> {
        let operation = GatewayOperation::Update;
        let request = self.client.put(self.record_url(resource, id)).json(record);
        let response = self.send(operation, resource, request).await?;
        Self::read_object(operation, resource, response).await
    }

    #[instrument(name = "gateway_delete", skip(self), fields(resource = %resource))]
    async fn delete(&self, resource: &ResourceName, id: u64) -> GatewayResult<()> {
        let operation = GatewayOperation::Delete;
        let request = self.client.delete(self.record_url(resource, id));
        self.send(operation, resource, request).await?;
        Ok(())
    }
}
