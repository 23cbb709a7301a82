//! Provider response envelopes and request filters

use super::models::nullable;
use crate::error::{DeployError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Common wrapper around every provider response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub errors: Vec<Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub warnings: Vec<Value>,
    #[serde(default)]
    pub response: Option<Value>,
}

impl Envelope {
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }

    /// Turn an optional raw envelope into the typed payload of a mutating call.
    ///
    /// An absent envelope, an explicit `error` status or a missing `response`
    /// are all `RemoteOperation` errors carrying the provider's `errors` list.
    pub fn into_action<T: DeserializeOwned>(raw: Option<Value>, operation: &str) -> Result<T> {
        let Some(raw) = raw else {
            return Err(DeployError::remote(operation, Value::Null));
        };
        let envelope: Envelope = serde_json::from_value(raw)?;
        envelope.log_warnings(operation);

        if envelope.is_error() {
            return Err(DeployError::remote(operation, Value::Array(envelope.errors)));
        }

        match envelope.response {
            Some(response) if !response.is_null() => Ok(serde_json::from_value(response)?),
            _ => Err(DeployError::remote(operation, Value::Array(envelope.errors))),
        }
    }

    /// Check the status of a mutating call whose response body is not needed.
    pub fn into_status(raw: Option<Value>, operation: &str) -> Result<()> {
        let Some(raw) = raw else {
            return Err(DeployError::remote(operation, Value::Null));
        };
        let envelope: Envelope = serde_json::from_value(raw)?;
        envelope.log_warnings(operation);

        if envelope.is_error() {
            return Err(DeployError::remote(operation, Value::Array(envelope.errors)));
        }
        Ok(())
    }

    /// Turn an optional raw envelope into a page of find results.
    ///
    /// An absent envelope means "nothing found". An explicit `error` status is
    /// still a failure so that a broken lookup never reads as zero matches.
    pub fn into_page<T: DeserializeOwned>(raw: Option<Value>, operation: &str) -> Result<FindPage<T>> {
        let Some(raw) = raw else {
            return Ok(FindPage::default());
        };
        let envelope: Envelope = serde_json::from_value(raw)?;
        envelope.log_warnings(operation);

        if envelope.is_error() {
            return Err(DeployError::remote(operation, Value::Array(envelope.errors)));
        }

        match envelope.response {
            Some(response) if !response.is_null() => Ok(serde_json::from_value(response)?),
            _ => Ok(FindPage::default()),
        }
    }

    fn log_warnings(&self, operation: &str) {
        for warning in &self.warnings {
            tracing::warn!("{} warning: {}", operation, warning);
        }
    }
}

/// Body of a successful find response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct FindPage<T> {
    #[serde(default = "Vec::new", deserialize_with = "nullable")]
    pub data: Vec<T>,
    #[serde(default)]
    pub total_entries: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub total_pages: u64,
}

impl<T> Default for FindPage<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            total_entries: 0,
            limit: 0,
            page: 0,
            total_pages: 0,
        }
    }
}

impl<T> FindPage<T> {
    /// Number of matches on the provider side, even if `limit` cut the page short
    pub fn total(&self) -> u64 {
        self.total_entries.max(self.data.len() as u64)
    }
}

/// Body of a find request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindQuery {
    pub filter: Filter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl FindQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            limit: None,
            page: None,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// Find filter, either a single field condition or an AND group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Filter {
    Field {
        field: String,
        value: String,
    },
    #[serde(rename_all = "camelCase")]
    Group {
        sub_filter_connective: String,
        sub_filter: Vec<Filter>,
    },
}

impl Filter {
    pub fn field(field: &str, value: impl Into<String>) -> Self {
        Self::Field {
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Combine conditions with AND. A single condition is returned unwrapped.
    pub fn all(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            return filters.remove(0);
        }
        Self::Group {
            sub_filter_connective: "AND".to_string(),
            sub_filter: filters,
        }
    }
}
