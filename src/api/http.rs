//! HTTP utilities for provider JSON API calls

use crate::error::{DeployError, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for provider API calls
#[derive(Clone)]
pub struct ApiHttpClient {
    client: Client,
}

impl ApiHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("hostsync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// POST a JSON body and return the decoded envelope.
    ///
    /// `Ok(None)` means the provider returned no envelope at all (404 or an
    /// empty body). The body may contain the auth token, so only the URL is
    /// logged.
    pub async fn post(&self, url: &str, body: &Value) -> Result<Option<Value>> {
        tracing::debug!("POST {}", url);

        let response = self.client.post(url).json(body).send().await?;

        let status = response.status();
        let response_body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            tracing::debug!("POST {} returned 404, treating as absent envelope", url);
            return Ok(None);
        }

        if !status.is_success() {
            let body = sanitize_for_log(&response_body);
            tracing::error!("API error: {} - {}", status, body);
            return Err(DeployError::Transport {
                status: status.as_u16(),
                body,
            });
        }

        if response_body.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&response_body)?))
    }
}
