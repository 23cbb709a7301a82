//! hostsync
//!
//! Reconciles the applications declared in a hosting manifest against the
//! hosting.de API: webspaces with their SSH deploy users, virtual hosts, cron
//! jobs, databases and database users.

pub mod api;
pub mod config;
pub mod credential;
pub mod error;
pub mod manifest;
pub mod reconcile;
pub mod report;
pub mod resource;
pub mod routing;
pub mod schedule;

pub use api::{ApiClient, Service};
pub use config::ApiSettings;
pub use credential::Secret;
pub use error::{DeployError, Result};
pub use manifest::Manifest;
pub use reconcile::{DeploySettings, Reconciler};
pub use report::{ActionType, DeploymentReport};
