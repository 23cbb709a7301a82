//! Deployment report
//!
//! What a reconciliation run did, plus the credentials generated along the
//! way. Credentials appear here once and are never re-derivable afterwards;
//! the caller must persist them.

use crate::credential::Secret;
use crate::resource::ResourceKind;
use serde::Serialize;
use std::fmt;

/// What happened to one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Created,
    Updated,
    Unchanged,
    Deleted,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::Created => write!(f, "created"),
            ActionType::Updated => write!(f, "updated"),
            ActionType::Unchanged => write!(f, "unchanged"),
            ActionType::Deleted => write!(f, "deleted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub kind: &'static str,
    pub name: String,
    pub id: String,
    pub action: ActionType,
}

/// Access data for a database user created during this run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseCredentials {
    /// Environment variable the application reads the connection from
    pub env_var: String,
    pub database_name: String,
    pub db_name: String,
    pub host_name: String,
    pub user_name: String,
    pub password: Secret,
}

/// Login data for a webspace user created during this run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCredentials {
    pub user_name: String,
    pub password: Secret,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentReport {
    pub started_at: String,
    pub outcomes: Vec<Outcome>,
    pub database_credentials: Vec<DatabaseCredentials>,
    pub user_credentials: Vec<UserCredentials>,
}

impl DeploymentReport {
    pub fn new() -> Self {
        Self {
            started_at: chrono::Utc::now().to_rfc3339(),
            outcomes: Vec::new(),
            database_credentials: Vec::new(),
            user_credentials: Vec::new(),
        }
    }

    pub fn record(&mut self, kind: ResourceKind, name: &str, id: &str, action: ActionType) {
        tracing::info!("{} {} ({}) {}", kind, name, id, action);
        self.outcomes.push(Outcome {
            kind: kind.as_str(),
            name: name.to_string(),
            id: id.to_string(),
            action,
        });
    }

    pub fn outcomes_by_action(&self, action: ActionType) -> Vec<&Outcome> {
        self.outcomes.iter().filter(|o| o.action == action).collect()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            created: self.outcomes_by_action(ActionType::Created).len(),
            updated: self.outcomes_by_action(ActionType::Updated).len(),
            unchanged: self.outcomes_by_action(ActionType::Unchanged).len(),
            deleted: self.outcomes_by_action(ActionType::Deleted).len(),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.outcomes.iter().any(|o| o.action != ActionType::Unchanged)
    }
}

impl Default for DeploymentReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} unchanged, {} deleted",
            self.created, self.updated, self.unchanged, self.deleted
        )
    }
}
