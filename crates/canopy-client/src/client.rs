//! HTTP gateway for the dashboard API

use crate::credentials::CredentialStore;
use crate::error::{ClientError, Result};
use crate::types::*;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// HTTP gateway for the dashboard API
///
/// Every call goes through [`Gateway::request`], which
/// - attaches `Authorization: Bearer <token>` when the credential store has one,
/// - aborts after `timeout_ms`,
/// - turns a non-2xx status into [`ClientError::Server`] carrying the
///   server's message,
/// - clears the credential store on 401.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use canopy_client::{Gateway, GatewayConfig, MemoryCredentialStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = Gateway::new(GatewayConfig::default(), Arc::new(MemoryCredentialStore::new()))?;
/// let stats = gateway.get::<serde_json::Value>("/dashboard/stats").await?;
/// println!("{:?}", stats.data);
/// # Ok(())
/// # }
/// ```
pub struct Gateway {
    config: GatewayConfig,
    client: Client,
    credentials: Arc<dyn CredentialStore>,
}

impl Gateway {
    /// Create a new gateway
    pub fn new(config: GatewayConfig, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidConfig(format!("base_url {}: {}", config.base_url, e)))?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            config,
            client,
            credentials,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    // ==================== Verbs ====================

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<ApiResponse<T>> {
        self.request(Method::Get, endpoint, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiResponse<T>> {
        let body = serde_json::to_value(body)?;
        self.request(Method::Post, endpoint, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<ApiResponse<T>> {
        let body = serde_json::to_value(body)?;
        self.request(Method::Put, endpoint, Some(body)).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse<T>> {
        self.request(Method::Patch, endpoint, body).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<ApiResponse<T>> {
        self.request(Method::Delete, endpoint, None).await
    }

    // ==================== Core ====================

    /// Send a request and unwrap the response envelope
    ///
    /// A 2xx response whose envelope says `success: false` is returned as-is;
    /// deciding what that means is up to the caller.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse<T>> {
        let url = self.url(endpoint);
        tracing::debug!(%method, %url, "dashboard request");

        let mut request = self.client.request(method.into(), &url);
        if let Some(token) = self.credentials.token() {
            request = request.bearer_auth(token);
        }
        if let Some(ref body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;

        tracing::debug!(%method, %url, status = status.as_u16(), "dashboard response");

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Server rejected credential, clearing stored token");
            if let Err(e) = self.credentials.clear() {
                tracing::warn!("Failed to clear credential: {}", e);
            }
        }

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(ErrorBody::into_reason)
                .unwrap_or_else(|| format!("Request failed with HTTP status {}", status.as_u16()));
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let envelope = serde_json::from_slice(&bytes)?;
        Ok(envelope)
    }

    // ==================== Helper Methods ====================

    fn url(&self, endpoint: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if endpoint.starts_with('/') {
            format!("{}{}", base, endpoint)
        } else {
            format!("{}/{}", base, endpoint)
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.config.timeout_ms)
        } else {
            ClientError::Network(err)
        }
    }
}
