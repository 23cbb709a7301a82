//! Resource Reconciler
//!
//! Drives one manifest application to the provider: look the resource up,
//! create it when absent, update it when present, fail when ambiguous.
//!
//! # Module Structure
//!
//! - [`workspace`] - Webspace and its SSH deploy user
//! - [`vhost`] - Virtual hosts per declared domain
//! - [`database`] - Databases, database users and access grants
//! - [`prune`] - Removal of project resources no longer in the manifest
//!
//! Two-step creates (user first, then the resource referencing it) are not
//! rolled back when the second step fails. The already-created user stays
//! behind and a re-run creates a new one.

pub mod database;
pub mod prune;
pub mod vhost;
pub mod workspace;

use crate::api::ApiClient;
use crate::credential::Secret;
use crate::error::Result;
use crate::manifest::{Manifest, ManifestApp};
use crate::report::DeploymentReport;
use crate::resource::Locator;

/// Name prefix of every webspace user this tool creates
pub const MANAGED_USER_PREFIX: &str = "hostsync--";

/// Comment attached to every resource this tool creates
pub const MANAGED_COMMENT: &str = "Created by hostsync. Please do not change name.";

/// Inputs that do not come from the manifest
#[derive(Debug, Clone)]
pub struct DeploySettings {
    /// Prefix of every resource name
    pub project: String,
    /// Public key installed on newly created webspace users
    pub ssh_public_key: Secret,
    /// PHP version used when the application does not pin one
    pub default_php_version: Option<String>,
}

pub struct Reconciler {
    client: ApiClient,
    settings: DeploySettings,
}

impl Reconciler {
    pub fn new(client: ApiClient, settings: DeploySettings) -> Self {
        Self { client, settings }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn settings(&self) -> &DeploySettings {
        &self.settings
    }

    pub fn locator(&self) -> Locator<'_> {
        Locator::new(&self.client)
    }

    /// `<project>-<app>`
    pub fn workspace_name(&self, app_key: &str) -> String {
        format!("{}-{}", self.settings.project, app_key)
    }

    /// `<project>-<logical database name>`
    pub fn database_name(&self, logical_name: &str) -> String {
        format!("{}-{}", self.settings.project, logical_name)
    }

    /// Database user of an application, `<project>-<app>`
    pub fn database_user_name(&self, app_key: &str) -> String {
        format!("{}-{}", self.settings.project, app_key)
    }

    /// Manifest setting, then the environment default, then unset
    pub fn php_version<'a>(&'a self, app: &'a ManifestApp) -> Option<&'a str> {
        app.php_version()
            .or(self.settings.default_php_version.as_deref())
    }

    /// Reconcile every resource of one application.
    ///
    /// Outcomes and credentials are written to `report` as they happen, so a
    /// caller still gets the credentials of resources created before a later
    /// step failed.
    pub async fn deploy(
        &self,
        manifest: &Manifest,
        app_key: &str,
        report: &mut DeploymentReport,
    ) -> Result<()> {
        let app = manifest.app(app_key)?;
        tracing::info!("Reconciling application {} of project {}", app_key, self.settings.project);

        let webspace = self.reconcile_workspace(app_key, app, report).await?;

        for (domain_name, web) in &app.web {
            self.reconcile_vhost(&webspace, domain_name, web, app, report)
                .await?;
        }

        for (env_var, logical_name) in &app.databases {
            self.reconcile_database(app_key, app, env_var, logical_name, report)
                .await?;
        }

        tracing::info!("Application {} reconciled: {}", app_key, report.summary());
        Ok(())
    }
}
