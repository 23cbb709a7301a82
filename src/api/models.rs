//! Provider resource representations
//!
//! Fields the engine reads or owns are typed. Everything else the provider
//! returns is kept in `extra` so that a full-object update can resubmit it
//! unchanged.

use crate::schedule::CronJob;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Read an explicit `null` as the type's default, same as a missing key
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Webspace (workspace) resource.
///
/// Pool and account ids stay in `extra` so an update echoes them as read,
/// `null` or absent included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webspace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "nullable")]
    pub cron_jobs: Vec<CronJob>,
    #[serde(default)]
    pub redis_enabled: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub accesses: Vec<WebspaceAccess>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// User capability grant on a webspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebspaceAccess {
    pub user_id: String,
    #[serde(default)]
    pub ssh_access: bool,
    #[serde(default)]
    pub ftp_access: bool,
    #[serde(default)]
    pub stats_access: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Webhosting user (SSH deploy account)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebspaceUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub ssh_key: Option<String>,
}

/// Virtual host resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualHost {
    pub id: String,
    pub domain_name: String,
    #[serde(default)]
    pub webspace_id: String,
    #[serde(default)]
    pub web_root: String,
    #[serde(default)]
    pub php_version: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Database resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub product_code: String,
    #[serde(default)]
    pub force_ssl: bool,
    #[serde(default)]
    pub storage_quota: u64,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub db_name: String,
    #[serde(default)]
    pub host_name: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub accesses: Vec<DatabaseAccess>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Database {
    /// Login name the provider assigned to a user on this database
    pub fn login_for(&self, user_id: &str) -> Option<&str> {
        self.accesses
            .iter()
            .find(|a| a.user_id == user_id)
            .and_then(|a| a.db_login.as_deref())
    }
}

pub const FULL_ACCESS: [&str; 3] = ["read", "write", "schema"];

/// Access grant of a database user on a database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseAccess {
    pub user_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub access_level: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DatabaseAccess {
    /// Read, write and schema rights, the grant every managed user receives
    pub fn full(user_id: &str, database_id: Option<&str>) -> Self {
        Self {
            user_id: user_id.to_string(),
            access_level: FULL_ACCESS.iter().map(|level| level.to_string()).collect(),
            database_id: database_id.map(str::to_string),
            db_login: None,
            user_name: None,
            extra: Map::new(),
        }
    }
}

/// Database user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub db_user_name: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub status: String,
}
