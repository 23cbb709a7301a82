//! Webspace reconciliation

use super::{Reconciler, MANAGED_COMMENT, MANAGED_USER_PREFIX};
use crate::api::models::{Webspace, WebspaceAccess, WebspaceUser};
use crate::api::Service;
use crate::credential::{new_credential, Secret};
use crate::error::Result;
use crate::manifest::ManifestApp;
use crate::report::{ActionType, DeploymentReport, UserCredentials};
use crate::resource::ResourceKind;
use crate::schedule::{self, CronJob};
use serde::Serialize;

pub const WEBSPACE_PRODUCT: &str = "webhosting-webspace-v1-1m";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebspaceCreateRequest {
    pub pool_id: Option<String>,
    pub webspace: NewWebspace,
    pub accesses: Vec<NewWebspaceAccess>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWebspace {
    pub name: String,
    pub account_id: Option<String>,
    pub comments: String,
    pub product_code: String,
    pub cron_jobs: Vec<CronJob>,
    pub redis_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWebspaceAccess {
    pub user_id: String,
    pub ssh_access: bool,
}

/// Full-object replace: the whole webspace plus its access list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebspaceUpdateRequest {
    pub webspace: Webspace,
    pub accesses: Vec<WebspaceAccess>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebspaceUserCreateRequest {
    pub user: NewWebspaceUser,
    pub password: Secret,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWebspaceUser {
    pub ssh_key: Secret,
    pub name: String,
    pub comment: String,
}

/// Create request for a webspace whose SSH user already exists
pub fn build_create(
    name: &str,
    app: &ManifestApp,
    cron_jobs: Vec<CronJob>,
    redis_enabled: bool,
    user_id: &str,
) -> WebspaceCreateRequest {
    WebspaceCreateRequest {
        pool_id: app.pool.clone(),
        webspace: NewWebspace {
            name: name.to_string(),
            account_id: app.account.clone(),
            comments: MANAGED_COMMENT.to_string(),
            product_code: WEBSPACE_PRODUCT.to_string(),
            cron_jobs,
            redis_enabled,
        },
        accesses: vec![NewWebspaceAccess {
            user_id: user_id.to_string(),
            ssh_access: true,
        }],
    }
}

/// Desired state of an existing webspace.
///
/// A structural copy of `current` with only the cron jobs and the redis flag
/// replaced; every other field, the access list included, is carried over.
pub fn build_update(current: &Webspace, cron_jobs: Vec<CronJob>, redis_enabled: bool) -> Webspace {
    Webspace {
        cron_jobs,
        redis_enabled,
        ..current.clone()
    }
}

impl Reconciler {
    pub async fn reconcile_workspace(
        &self,
        app_key: &str,
        app: &ManifestApp,
        report: &mut DeploymentReport,
    ) -> Result<Webspace> {
        let name = self.workspace_name(app_key);
        let cron_jobs = schedule::encode_all(&app.crons, self.php_version(app))?;
        let redis_enabled = app.redis.unwrap_or(false);

        match self.locator().find_one_by_name::<Webspace>(&name).await? {
            None => {
                tracing::info!("No active webspace {}, creating it", name);
                let webspace = self
                    .create_workspace(&name, app, cron_jobs, redis_enabled, report)
                    .await?;
                report.record(ResourceKind::Workspace, &webspace.name, &webspace.id, ActionType::Created);
                Ok(webspace)
            }
            Some(current) => {
                let desired = build_update(&current, cron_jobs, redis_enabled);
                if desired == current {
                    report.record(ResourceKind::Workspace, &current.name, &current.id, ActionType::Unchanged);
                    return Ok(current);
                }

                tracing::info!("Webspace {} ({}) differs from manifest, updating", current.name, current.id);
                let webspace = self.update_workspace(desired).await?;
                report.record(ResourceKind::Workspace, &webspace.name, &webspace.id, ActionType::Updated);
                Ok(webspace)
            }
        }
    }

    /// Create the SSH deploy user, then the webspace granting it SSH access
    pub async fn create_workspace(
        &self,
        name: &str,
        app: &ManifestApp,
        cron_jobs: Vec<CronJob>,
        redis_enabled: bool,
        report: &mut DeploymentReport,
    ) -> Result<Webspace> {
        let (user, password) = self.create_workspace_user(name).await?;
        report.user_credentials.push(UserCredentials {
            user_name: user.name.clone(),
            password,
        });

        let request = build_create(name, app, cron_jobs, redis_enabled, &user.id);
        let result = self
            .client()
            .execute::<_, Webspace>(Service::Webhosting, "webspaceCreate", &request)
            .await;

        if let Err(e) = &result {
            tracing::warn!(
                hazard = "partial_provisioning",
                orphaned_user_id = %user.id,
                "Webspace user {} was created but webspace {} was not: {}. The user is not removed; a re-run creates a new one",
                user.name,
                name,
                e
            );
        }
        result
    }

    /// Submit the full webspace object back to the provider
    pub async fn update_workspace(&self, webspace: Webspace) -> Result<Webspace> {
        let accesses = webspace.accesses.clone();
        let request = WebspaceUpdateRequest { webspace, accesses };
        self.client()
            .execute(Service::Webhosting, "webspaceUpdate", &request)
            .await
    }

    /// Create an SSH-enabled webspace user with a fresh password
    pub async fn create_workspace_user(&self, webspace_name: &str) -> Result<(WebspaceUser, Secret)> {
        let password = new_credential();
        let request = WebspaceUserCreateRequest {
            user: NewWebspaceUser {
                ssh_key: self.settings().ssh_public_key.clone(),
                name: format!("{}{}", MANAGED_USER_PREFIX, webspace_name),
                comment: MANAGED_COMMENT.to_string(),
            },
            password: password.clone(),
        };

        let user: WebspaceUser = self
            .client()
            .execute(Service::Webhosting, "userCreate", &request)
            .await?;
        tracing::info!("Created webspace user {} ({})", user.name, user.id);
        Ok((user, password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::CronSpec;
    use serde_json::json;

    fn existing() -> Webspace {
        serde_json::from_value(json!({
            "id": "ws-1",
            "name": "proj-app",
            "status": "active",
            "poolId": "pool-1",
            "productCode": "webhosting-webspace-v1-1m",
            "storageQuota": 20480,
            "cronJobs": [],
            "redisEnabled": true,
            "accesses": [
                {"userId": "u-1", "sshAccess": true, "ftpAccess": true, "statsAccess": false}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_build_create_payload() {
        let app = ManifestApp {
            pool: Some("pool-1".into()),
            account: Some("acc-1".into()),
            ..Default::default()
        };
        let request = build_create("proj-app", &app, vec![], false, "u-9");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["poolId"], "pool-1");
        assert_eq!(value["webspace"]["name"], "proj-app");
        assert_eq!(value["webspace"]["accountId"], "acc-1");
        assert_eq!(value["webspace"]["productCode"], WEBSPACE_PRODUCT);
        assert_eq!(value["accesses"], json!([{"userId": "u-9", "sshAccess": true}]));
    }

    #[test]
    fn test_build_update_only_touches_owned_fields() {
        let current = existing();
        let jobs = schedule::encode_all(
            &[CronSpec {
                cmd: Some("backup.sh".into()),
                every: "day".into(),
                ..Default::default()
            }],
            None,
        )
        .unwrap();

        let desired = build_update(&current, jobs.clone(), true);
        assert_eq!(desired.cron_jobs, jobs);
        assert_eq!(desired.accesses, current.accesses);
        assert_eq!(desired.extra, current.extra);
        assert_eq!(desired.extra["storageQuota"], 20480);
        assert_eq!(desired.extra["poolId"], "pool-1");
        assert!(desired.redis_enabled);
    }

    #[test]
    fn test_build_update_without_changes_is_equal() {
        let current = existing();
        let desired = build_update(&current, vec![], true);
        assert_eq!(desired, current);
    }

    #[test]
    fn test_user_request_serialization() {
        let request = WebspaceUserCreateRequest {
            user: NewWebspaceUser {
                ssh_key: Secret::new("ssh-ed25519 AAAA"),
                name: "hostsync--proj-app".into(),
                comment: MANAGED_COMMENT.into(),
            },
            password: Secret::new("pw"),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "user": {"sshKey": "ssh-ed25519 AAAA", "name": "hostsync--proj-app", "comment": MANAGED_COMMENT},
                "password": "pw"
            })
        );
    }
}
