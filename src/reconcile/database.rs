//! Database reconciliation
//!
//! Each application gets its own database user per declared database. A new
//! database is created together with that user; an existing database the user
//! cannot access yet gets a new user appended to its access list.

use super::{Reconciler, MANAGED_COMMENT};
use crate::api::models::{Database, DatabaseAccess, DatabaseUser};
use crate::api::Service;
use crate::credential::{new_credential, Secret};
use crate::error::Result;
use crate::manifest::ManifestApp;
use crate::report::{ActionType, DatabaseCredentials, DeploymentReport};
use crate::resource::ResourceKind;
use serde::Serialize;

pub const DATABASE_PRODUCT: &str = "database-mariadb-single-v1-1m";
/// Storage quota of new databases, in MiB
pub const STORAGE_QUOTA: u64 = 512;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseCreateRequest {
    pub pool_id: Option<String>,
    pub database: NewDatabase,
    pub accesses: Vec<DatabaseAccess>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDatabase {
    pub name: String,
    pub comments: String,
    pub product_code: String,
    pub storage_quota: u64,
    pub account_id: Option<String>,
}

/// Full-object replace of a database. Only the identity, product, quota and
/// comment fields are echoed, alongside the complete access list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseUpdateRequest {
    pub database: DatabaseIdentity,
    pub accesses: Vec<DatabaseAccess>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseIdentity {
    pub id: String,
    pub name: String,
    pub product_code: String,
    pub force_ssl: bool,
    pub storage_quota: u64,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseUserCreateRequest {
    pub user: NewDatabaseUser,
    pub password: Secret,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDatabaseUser {
    pub name: String,
    pub comment: String,
    pub account_id: Option<String>,
}

/// A database together with the credentials of the user just granted on it
#[derive(Debug, Clone)]
pub struct ProvisionedAccess {
    pub database: Database,
    pub user_name: String,
    pub password: Secret,
}

pub fn build_create(name: &str, app: &ManifestApp, user_id: &str) -> DatabaseCreateRequest {
    DatabaseCreateRequest {
        pool_id: app.pool.clone(),
        database: NewDatabase {
            name: name.to_string(),
            comments: MANAGED_COMMENT.to_string(),
            product_code: DATABASE_PRODUCT.to_string(),
            storage_quota: STORAGE_QUOTA,
            account_id: app.account.clone(),
        },
        accesses: vec![DatabaseAccess::full(user_id, None)],
    }
}

/// Existing accesses followed by a full grant for `user_id`
pub fn build_add_access(database: &Database, user_id: &str) -> DatabaseUpdateRequest {
    let mut accesses = database.accesses.clone();
    accesses.push(DatabaseAccess::full(user_id, Some(&database.id)));

    DatabaseUpdateRequest {
        database: DatabaseIdentity {
            id: database.id.clone(),
            name: database.name.clone(),
            product_code: database.product_code.clone(),
            force_ssl: database.force_ssl,
            storage_quota: database.storage_quota,
            comments: database.comments.clone(),
        },
        accesses,
    }
}

impl Reconciler {
    pub async fn reconcile_database(
        &self,
        app_key: &str,
        app: &ManifestApp,
        env_var: &str,
        logical_name: &str,
        report: &mut DeploymentReport,
    ) -> Result<Database> {
        let name = self.database_name(logical_name);
        let user_name = self.database_user_name(app_key);

        let (provisioned, action) = match self.locator().find_one_by_name::<Database>(&name).await? {
            None => {
                tracing::info!("No active database {}, creating it", name);
                (self.create_database(&user_name, &name, app).await?, ActionType::Created)
            }
            Some(database) => {
                let granted = self
                    .locator()
                    .find_database_accesses(&user_name, &database.id)
                    .await?;
                if !granted.is_empty() {
                    report.record(ResourceKind::Database, &database.name, &database.id, ActionType::Unchanged);
                    return Ok(database);
                }

                tracing::info!("Database {} has no access for {}, adding one", name, user_name);
                (
                    self.add_database_access(&database, &user_name, app).await?,
                    ActionType::Updated,
                )
            }
        };

        let database = provisioned.database;
        report.database_credentials.push(DatabaseCredentials {
            env_var: env_var.to_string(),
            database_name: database.name.clone(),
            db_name: database.db_name.clone(),
            host_name: database.host_name.clone(),
            user_name: provisioned.user_name,
            password: provisioned.password,
        });
        report.record(ResourceKind::Database, &database.name, &database.id, action);
        Ok(database)
    }

    /// Create a database user, then the database granting it full access
    pub async fn create_database(
        &self,
        user_name: &str,
        database_name: &str,
        app: &ManifestApp,
    ) -> Result<ProvisionedAccess> {
        let (user, password) = self.create_database_user(user_name, app.account.as_deref()).await?;

        let request = build_create(database_name, app, &user.id);
        let database: Database = self
            .client()
            .execute(Service::Database, "databaseCreate", &request)
            .await
            .inspect_err(|e| partial_provisioning(&user, database_name, e))?;

        let user_name = database.login_for(&user.id).unwrap_or_default().to_string();
        Ok(ProvisionedAccess {
            database,
            user_name,
            password,
        })
    }

    /// Create a database user and append its grant to an existing database
    pub async fn add_database_access(
        &self,
        database: &Database,
        user_name: &str,
        app: &ManifestApp,
    ) -> Result<ProvisionedAccess> {
        let (user, password) = self.create_database_user(user_name, app.account.as_deref()).await?;

        let request = build_add_access(database, &user.id);
        let updated: Database = self
            .client()
            .execute(Service::Database, "databaseUpdate", &request)
            .await
            .inspect_err(|e| partial_provisioning(&user, &database.name, e))?;

        let user_name = updated.login_for(&user.id).unwrap_or_default().to_string();
        Ok(ProvisionedAccess {
            database: updated,
            user_name,
            password,
        })
    }

    pub async fn create_database_user(
        &self,
        user_name: &str,
        account_id: Option<&str>,
    ) -> Result<(DatabaseUser, Secret)> {
        let password = new_credential();
        let request = DatabaseUserCreateRequest {
            user: NewDatabaseUser {
                name: user_name.to_string(),
                comment: MANAGED_COMMENT.to_string(),
                account_id: account_id.map(str::to_string),
            },
            password: password.clone(),
        };

        let user: DatabaseUser = self
            .client()
            .execute(Service::Database, "userCreate", &request)
            .await?;
        tracing::info!("Created database user {} ({})", user.name, user.id);
        Ok((user, password))
    }
}

fn partial_provisioning(user: &DatabaseUser, database_name: &str, error: &crate::error::DeployError) {
    tracing::warn!(
        hazard = "partial_provisioning",
        orphaned_user_id = %user.id,
        "Database user {} was created but granting it on {} failed: {}. The user is not removed; a re-run creates a new one",
        user.name,
        database_name,
        error
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn existing() -> Database {
        serde_json::from_value(json!({
            "id": "db-1",
            "name": "proj-main",
            "status": "active",
            "productCode": "database-mariadb-single-v1-1m",
            "forceSsl": true,
            "storageQuota": 1024,
            "comments": "hand edited",
            "dbName": "db_1",
            "hostName": "mysql.example.net",
            "paidUntil": "2030-01-01",
            "accesses": [
                {"userId": "u-1", "databaseId": "db-1", "accessLevel": ["read"], "dbLogin": "dbu_1", "addDate": "2024-01-01"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_build_create_payload() {
        let app = ManifestApp {
            pool: Some("pool-db".into()),
            account: Some("acc-1".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(build_create("proj-main", &app, "u-2")).unwrap();
        assert_eq!(
            value,
            json!({
                "poolId": "pool-db",
                "database": {
                    "name": "proj-main",
                    "comments": MANAGED_COMMENT,
                    "productCode": DATABASE_PRODUCT,
                    "storageQuota": 512,
                    "accountId": "acc-1"
                },
                "accesses": [{"userId": "u-2", "accessLevel": ["read", "write", "schema"]}]
            })
        );
    }

    #[test]
    fn test_add_access_echoes_only_permitted_fields() {
        let value = serde_json::to_value(build_add_access(&existing(), "u-2")).unwrap();
        assert_eq!(
            value["database"],
            json!({
                "id": "db-1",
                "name": "proj-main",
                "productCode": "database-mariadb-single-v1-1m",
                "forceSsl": true,
                "storageQuota": 1024,
                "comments": "hand edited"
            })
        );
        assert!(value["database"].get("paidUntil").is_none());
    }

    #[test]
    fn test_add_access_appends_to_existing_list() {
        let request = build_add_access(&existing(), "u-2");
        assert_eq!(request.accesses.len(), 2);
        assert_eq!(request.accesses[0], existing().accesses[0]);
        assert_eq!(request.accesses[1].user_id, "u-2");
        assert_eq!(request.accesses[1].database_id.as_deref(), Some("db-1"));
        assert_eq!(request.accesses[1].access_level, vec!["read", "write", "schema"]);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["accesses"][0]["addDate"], "2024-01-01");
    }
}
