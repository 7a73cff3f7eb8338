//! reqwest implementation of [`PlatformApi`].

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use skillhub_auth::{AuthData, LoginCredentials, RegisterData, TokenPair};
use skillhub_core::{TenantConfig, TenantId};

use crate::{ApiEnvelope, ApiError, PlatformApi};

const TENANT_HEADER: &str = "X-Tenant-ID";

/// HTTP client for the platform's `/api/v1` endpoints.
///
/// No request timeout is configured: a hung call stays pending until the
/// server or the OS gives up.
#[derive(Debug, Clone)]
pub struct HttpPlatformApi {
    api_url: String,
    client: reqwest::Client,
}

impl HttpPlatformApi {
    /// `api_url` is the server origin, e.g. `https://api.skillhub.io`.
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            api_url,
            client: reqwest::Client::new(),
        }
    }

    /// `{api_url}/api/v1/<segments>`. Each segment is percent-encoded, so a
    /// tenant id can never step into another route.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| ApiError::Network(format!("invalid API URL {:?}: {e}", self.api_url)))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Network(format!("API URL {:?} cannot carry a path", self.api_url)))?
            .pop_if_empty()
            .extend(["api", "v1"])
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
        tenant_id: Option<&TenantId>,
        token: Option<&str>,
    ) -> Result<RequestBuilder, ApiError> {
        let mut req = self.client.request(method, self.endpoint(segments)?);

        if let Some(tenant_id) = tenant_id {
            req = req.header(TENANT_HEADER, tenant_id.as_str());
        }
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        Ok(req)
    }

    /// Send and unwrap the envelope, returning its `data`.
    async fn send<T>(&self, req: RequestBuilder) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let envelope = self.send_envelope(req).await?;
        let data = envelope
            .data
            .ok_or_else(|| ApiError::Parse("response envelope carried no data".to_string()))?;
        serde_json::from_value(data).map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn send_envelope(&self, req: RequestBuilder) -> Result<ApiEnvelope, ApiError> {
        let resp = req.send().await.map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| ApiError::Network(e.to_string()))?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "platform API response");

        if body.trim().is_empty() {
            return if status.is_success() {
                Ok(ApiEnvelope {
                    success: true,
                    data: None,
                    error: None,
                    message: None,
                    pagination: None,
                })
            } else {
                Err(ApiError::rejected(status.as_u16(), status_reason(status)))
            };
        }

        let envelope: ApiEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(ApiError::Parse(e.to_string())),
            Err(_) => return Err(ApiError::rejected(status.as_u16(), status_reason(status))),
        };

        if !status.is_success() {
            return Err(ApiError::rejected(status.as_u16(), envelope.failure_message()));
        }
        if !envelope.success {
            // 2xx with `success: false` is a logical rejection.
            return Err(ApiError::rejected(400, envelope.failure_message()));
        }

        Ok(envelope)
    }
}

fn status_reason(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[async_trait]
impl PlatformApi for HttpPlatformApi {
    async fn login(
        &self,
        tenant_id: &TenantId,
        credentials: &LoginCredentials,
    ) -> Result<AuthData, ApiError> {
        let req = self
            .request(Method::POST, &["auth", "login"], Some(tenant_id), None)?
            .json(credentials);
        self.send(req).await
    }

    async fn register(&self, tenant_id: &TenantId, data: &RegisterData) -> Result<AuthData, ApiError> {
        let req = self
            .request(Method::POST, &["auth", "register"], Some(tenant_id), None)?
            .json(data);
        self.send(req).await
    }

    async fn refresh(&self, tenant_id: &TenantId, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let req = self
            .request(Method::POST, &["auth", "refresh"], Some(tenant_id), None)?
            .json(&json!({ "refreshToken": refresh_token }));
        self.send(req).await
    }

    async fn logout(&self, tenant_id: &TenantId, token: Option<&str>) -> Result<(), ApiError> {
        let req = self.request(Method::POST, &["auth", "logout"], Some(tenant_id), token)?;
        self.send_envelope(req).await.map(|_| ())
    }

    async fn get_tenant(&self, tenant_id: &TenantId, token: Option<&str>) -> Result<TenantConfig, ApiError> {
        let req = self.request(Method::GET, &["tenants", tenant_id.as_str()], Some(tenant_id), token)?;
        self.send(req).await
    }

    async fn list_tenants(&self, token: Option<&str>) -> Result<Vec<TenantConfig>, ApiError> {
        let req = self.request(Method::GET, &["tenants"], None, token)?;
        self.send(req).await
    }

    async fn update_tenant_config(
        &self,
        tenant_id: &TenantId,
        updates: &Value,
        token: Option<&str>,
    ) -> Result<TenantConfig, ApiError> {
        let req = self
            .request(Method::PUT, &["tenants", tenant_id.as_str(), "config"], Some(tenant_id), token)?
            .json(updates);
        self.send(req).await
    }

    async fn health(&self) -> bool {
        let url = format!("{}/health", self.api_url);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(err) => {
                tracing::warn!("health check against {url} failed: {err}");
                false
            }
        }
    }
}
