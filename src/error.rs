//! Error types
//!
//! Every failure the reconciler can surface, grouped by how an operator
//! should react to it.

use crate::resource::ResourceKind;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployError {
    /// The manifest references something that does not exist.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A manifest value cannot be encoded for the provider.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// More than one active resource carries a name that must be unique.
    #[error(
        "We found {count} active {kind} resources with name \"{name}\" and cannot know where to deploy to"
    )]
    AmbiguousMatch {
        kind: ResourceKind,
        name: String,
        count: u64,
    },

    /// The provider answered with an error status or an empty envelope.
    #[error("{operation} failed: {payload}")]
    RemoteOperation { operation: String, payload: Value },

    /// Non-success HTTP status other than 404.
    #[error("API request failed: {status} - {body}")]
    Transport { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeployError {
    pub fn remote(operation: impl Into<String>, payload: Value) -> Self {
        Self::RemoteOperation {
            operation: operation.into(),
            payload,
        }
    }

    /// Business-logic failures are never retried by the engine. Only transport
    /// hiccups are worth a second attempt by the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { status, .. } => *status == 429 || *status >= 500,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
