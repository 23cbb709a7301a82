//! Removal of project resources the manifest no longer declares
//!
//! Only resources named `<project>-*` are candidates. Anything the manifest
//! still names is kept, whichever application declares it.

use super::{Reconciler, MANAGED_USER_PREFIX};
use crate::api::models::{Database, VirtualHost, Webspace, WebspaceUser};
use crate::error::Result;
use crate::manifest::Manifest;
use crate::report::{ActionType, DeploymentReport};
use crate::resource::Resource;
use serde_json::{Map, Value};
use std::collections::HashSet;

impl Reconciler {
    /// Webspace names the manifest declares
    pub fn declared_workspaces(&self, manifest: &Manifest) -> HashSet<String> {
        manifest
            .applications
            .keys()
            .map(|key| self.workspace_name(key))
            .collect()
    }

    /// Database names the manifest declares, across all applications
    pub fn declared_databases(&self, manifest: &Manifest) -> HashSet<String> {
        manifest
            .applications
            .values()
            .flat_map(|app| app.databases.values())
            .map(|logical| self.database_name(logical))
            .collect()
    }

    /// Delete undeclared webspaces (their vhosts first, their deploy users
    /// last) and databases.
    ///
    /// Does nothing unless the manifest opts in with `project.prune`.
    pub async fn prune(&self, manifest: &Manifest, report: &mut DeploymentReport) -> Result<()> {
        if !manifest.prune_enabled() {
            tracing::info!("Pruning is not enabled in the manifest, skipping");
            return Ok(());
        }

        let project = &self.settings().project;
        let locator = self.locator();

        let keep = self.declared_workspaces(manifest);
        let webspaces: Vec<Webspace> = locator.find_by_prefix(project).await?;
        for webspace in webspaces.iter().filter(|w| !keep.contains(&w.name)) {
            let vhosts = locator.find_vhosts_by_workspace(&webspace.id).await?;
            for vhost in &vhosts {
                self.delete::<VirtualHost>(vhost, report).await?;
            }
            self.delete::<Webspace>(webspace, report).await?;

            let user_name = format!("{}{}", MANAGED_USER_PREFIX, webspace.name);
            let users = locator.find_managed_webspace_users(&user_name).await?;
            for user in users.iter().filter(|u| u.name == user_name) {
                self.delete::<WebspaceUser>(user, report).await?;
            }
        }

        let keep = self.declared_databases(manifest);
        let databases: Vec<Database> = locator.find_by_prefix(project).await?;
        for database in databases.iter().filter(|d| !keep.contains(&d.name)) {
            self.delete::<Database>(database, report).await?;
        }

        tracing::info!("Prune of project {} finished: {}", project, report.summary());
        Ok(())
    }

    /// Delete one resource by id
    pub async fn delete<T: Resource>(&self, resource: &T, report: &mut DeploymentReport) -> Result<()> {
        let kind = T::KIND;
        let def = kind.def();

        let mut body = Map::new();
        body.insert(def.delete_id_param.to_string(), Value::String(resource.id().to_string()));

        tracing::warn!("Deleting {} {} ({})", kind, resource.name(), resource.id());
        self.client()
            .execute_unit(def.service, def.delete_method, &body)
            .await?;
        report.record(kind, resource.name(), resource.id(), ActionType::Deleted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::reconciler;

    const MANIFEST: &str = r#"
project:
  prune: true
applications:
  app:
    databases:
      DATABASE_URL: main
  worker:
    databases:
      DATABASE_URL: main
      CACHE_DB: cache
"#;

    #[test]
    fn test_declared_names() {
        let manifest = crate::manifest::Manifest::from_yaml_str(MANIFEST).unwrap();
        let r = reconciler(None);

        let workspaces = r.declared_workspaces(&manifest);
        assert_eq!(workspaces.len(), 2);
        assert!(workspaces.contains("proj-app"));
        assert!(workspaces.contains("proj-worker"));

        let databases = r.declared_databases(&manifest);
        assert_eq!(databases.len(), 2);
        assert!(databases.contains("proj-main"));
        assert!(databases.contains("proj-cache"));
    }
}
