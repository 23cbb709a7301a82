//! Provider API client
//!
//! Combines the HTTP transport with the endpoint layout and the auth token.
//! Every call is a `POST {base}/{service}/v1/json/{method}` whose body carries
//! `authToken`.

use super::envelope::{Envelope, FindPage, FindQuery};
use super::http::ApiHttpClient;
use crate::config::ApiSettings;
use crate::error::{DeployError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Provider service namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Webhosting,
    Database,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Webhosting => "webhosting",
            Self::Database => "database",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main provider client
#[derive(Clone)]
pub struct ApiClient {
    http: ApiHttpClient,
    settings: ApiSettings,
}

impl ApiClient {
    pub fn new(settings: ApiSettings) -> Result<Self> {
        Ok(Self {
            http: ApiHttpClient::new()?,
            settings,
        })
    }

    /// Build the URL of a provider method
    pub fn method_url(&self, service: Service, method: &str) -> String {
        format!(
            "{}/{}/v1/json/{}",
            self.settings.base_uri.as_str().trim_end_matches('/'),
            service,
            method
        )
    }

    /// Run a find method and return one page of typed results
    pub async fn find<T: DeserializeOwned>(
        &self,
        service: Service,
        method: &str,
        query: &FindQuery,
    ) -> Result<FindPage<T>> {
        let raw = self.post(service, method, to_object(query)?).await?;
        Envelope::into_page(raw, method)
    }

    /// Run a mutating method and return the typed `response` object
    pub async fn execute<B: Serialize, T: DeserializeOwned>(
        &self,
        service: Service,
        method: &str,
        body: &B,
    ) -> Result<T> {
        let raw = self.post(service, method, to_object(body)?).await?;
        Envelope::into_action(raw, method)
    }

    /// Run a method whose response body is irrelevant beyond its status
    pub async fn execute_unit<B: Serialize>(
        &self,
        service: Service,
        method: &str,
        body: &B,
    ) -> Result<()> {
        let raw = self.post(service, method, to_object(body)?).await?;
        Envelope::into_status(raw, method)
    }

    async fn post(
        &self,
        service: Service,
        method: &str,
        mut body: Map<String, Value>,
    ) -> Result<Option<Value>> {
        body.insert(
            "authToken".to_string(),
            Value::String(self.settings.auth_token.expose().to_string()),
        );
        let url = self.method_url(service, method);
        self.http.post(&url, &Value::Object(body)).await
    }
}

/// Request bodies are JSON objects so the auth token can be added
fn to_object<B: Serialize>(body: &B) -> Result<Map<String, Value>> {
    match serde_json::to_value(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(DeployError::Validation(
            "request body must be a JSON object".to_string(),
        )),
    }
}
