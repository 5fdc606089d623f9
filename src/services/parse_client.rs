use std::time::{Duration, Instant};

use anyhow::Context;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::config::BaasSettings;
use crate::schemas::parse::{
    FunctionEnvelope, HealthStatus, ParseErrorBody, QueryEnvelope, SignUpRequest,
};

const APPLICATION_ID_HEADER: &str = "X-Parse-Application-Id";
const REST_API_KEY_HEADER: &str = "X-Parse-REST-API-Key";
const MASTER_KEY_HEADER: &str = "X-Parse-Master-Key";
const SESSION_TOKEN_HEADER: &str = "X-Parse-Session-Token";

/// Which secret accompanies the application id on a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Credentials {
    /// Application id only, as used by `GET /login`.
    Anonymous,
    RestKey(String),
    MasterKey(String),
    SessionToken(String),
}

impl Credentials {
    /// REST key when configured, otherwise the master key.
    pub(crate) fn from_settings(settings: &BaasSettings) -> Self {
        if !settings.rest_api_key.is_empty() {
            Self::RestKey(settings.rest_api_key.clone())
        } else if !settings.master_key.is_empty() {
            Self::MasterKey(settings.master_key.clone())
        } else {
            Self::Anonymous
        }
    }

    fn header(&self) -> Option<(&'static str, &str)> {
        match self {
            Self::Anonymous => None,
            Self::RestKey(key) => Some((REST_API_KEY_HEADER, key)),
            Self::MasterKey(key) => Some((MASTER_KEY_HEADER, key)),
            Self::SessionToken(token) => Some((SESSION_TOKEN_HEADER, token)),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ParseApiError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} returned status {status}: {message}")]
    Status { path: String, status: StatusCode, code: Option<i64>, message: String },
    #[error("unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ParseApiError {
    pub(crate) fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }
}

/// A reply whose status has not been interpreted yet.
#[derive(Debug, Clone)]
pub(crate) struct RawResponse {
    pub(crate) path: String,
    pub(crate) status: StatusCode,
    pub(crate) body: String,
}

impl RawResponse {
    pub(crate) fn body_preview(&self, max_chars: usize) -> String {
        self.body.chars().take(max_chars).collect()
    }

    /// Fails with the Parse error message on a non-success status.
    pub(crate) fn decode<T: DeserializeOwned>(&self) -> Result<T, ParseApiError> {
        if !self.status.is_success() {
            let parsed = serde_json::from_str::<ParseErrorBody>(&self.body).ok();
            let code = parsed.as_ref().and_then(|body| body.code);
            let message = parsed
                .and_then(|body| body.error)
                .unwrap_or_else(|| self.body_preview(200));
            return Err(ParseApiError::Status {
                path: self.path.clone(),
                status: self.status,
                code,
                message,
            });
        }

        serde_json::from_str(&self.body)
            .map_err(|source| ParseApiError::Decode { path: self.path.clone(), source })
    }
}

/// Thin client over the Parse REST API.
#[derive(Debug, Clone)]
pub(crate) struct ParseClient {
    client: Client,
    base_url: String,
    app_id: String,
}

impl ParseClient {
    pub(crate) fn from_settings(settings: &BaasSettings) -> anyhow::Result<Self> {
        Self::new(settings.api_base(), settings.app_id.clone(), settings.request_timeout())
    }

    pub(crate) fn new(base_url: String, app_id: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .timeout(timeout)
            .build()
            .context("Failed to build Parse HTTP client")?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), app_id })
    }

    pub(crate) async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        credentials: &Credentials,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<RawResponse, ParseApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .client
            .request(method.clone(), url)
            .header(APPLICATION_ID_HEADER, &self.app_id);

        if let Some((name, value)) = credentials.header() {
            builder = builder.header(name, value);
        }
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|source| ParseApiError::Transport { path: path.to_string(), source })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ParseApiError::Transport { path: path.to_string(), source })?;

        tracing::debug!(
            method = %method,
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Parse request finished"
        );

        Ok(RawResponse { path: path.to_string(), status, body })
    }

    /// Runs a Cloud Code function and returns its `result` payload.
    pub(crate) async fn call_function<T: DeserializeOwned>(
        &self,
        name: &str,
        credentials: &Credentials,
        params: &Value,
    ) -> Result<T, ParseApiError> {
        let envelope: FunctionEnvelope<T> =
            self.call_function_raw(name, credentials, params).await?.decode()?;
        Ok(envelope.result)
    }

    pub(crate) async fn call_function_raw(
        &self,
        name: &str,
        credentials: &Credentials,
        params: &Value,
    ) -> Result<RawResponse, ParseApiError> {
        self.send(Method::POST, &format!("/functions/{name}"), credentials, &[], Some(params)).await
    }

    /// Fetches up to `limit` objects of a class with `include` relations expanded.
    pub(crate) async fn fetch_class<T: DeserializeOwned>(
        &self,
        class_name: &str,
        credentials: &Credentials,
        include: &[&str],
        limit: u32,
    ) -> Result<Vec<T>, ParseApiError> {
        let mut query = Vec::with_capacity(2);
        if !include.is_empty() {
            query.push(("include", include.join(",")));
        }
        query.push(("limit", limit.to_string()));

        let response = self
            .send::<Value>(Method::GET, &format!("/classes/{class_name}"), credentials, &query, None)
            .await?;
        let envelope: QueryEnvelope<T> = response.decode()?;
        Ok(envelope.results)
    }

    pub(crate) async fn health(
        &self,
        credentials: &Credentials,
    ) -> Result<HealthStatus, ParseApiError> {
        self.send::<Value>(Method::GET, "/health", credentials, &[], None).await?.decode()
    }

    pub(crate) async fn sign_up(
        &self,
        credentials: &Credentials,
        username: &str,
        password: &str,
    ) -> Result<RawResponse, ParseApiError> {
        let body = SignUpRequest { username, password };
        self.send(Method::POST, "/users", credentials, &[], Some(&body)).await
    }

    pub(crate) async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RawResponse, ParseApiError> {
        let query = [("username", username.to_string()), ("password", password.to_string())];
        self.send::<Value>(Method::GET, "/login", &Credentials::Anonymous, &query, None).await
    }

    pub(crate) async fn delete_user(
        &self,
        credentials: &Credentials,
        object_id: &str,
    ) -> Result<RawResponse, ParseApiError> {
        self.send::<Value>(Method::DELETE, &format!("/users/{object_id}"), credentials, &[], None)
            .await
    }
}
