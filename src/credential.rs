//! Credentials
//!
//! Fresh random passwords for newly created users, and a wrapper that keeps
//! secrets out of logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A secret string. `Debug` and `Display` never reveal the value; it is only
/// exposed through [`Secret::expose`] or when serialized into a request or
/// the deployment report.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Generate a new password for a user that is about to be created.
///
/// A v4 UUID carries 122 random bits from the OS generator. Every call yields
/// a new value; nothing is derived from the user or resource name.
pub fn new_credential() -> Secret {
    Secret(Uuid::new_v4().to_string())
}
