//! Resource kinds and their provider field names

use crate::api::models::{Database, DatabaseUser, VirtualHost, Webspace, WebspaceUser};
use crate::api::Service;
use serde::de::DeserializeOwned;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Workspace,
    VirtualHost,
    Database,
    DatabaseUser,
    WorkspaceUser,
}

/// Provider-side names used to find and delete one kind of resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDef {
    pub service: Service,
    pub find_method: &'static str,
    pub delete_method: &'static str,
    /// Body key holding the id in a delete request
    pub delete_id_param: &'static str,
    pub id_field: &'static str,
    pub name_field: &'static str,
    /// Filter field used to hide non-active resources, if the kind has one
    pub status_field: Option<&'static str>,
}

impl ResourceKind {
    pub fn def(&self) -> ResourceDef {
        match self {
            Self::Workspace => ResourceDef {
                service: Service::Webhosting,
                find_method: "webspacesFind",
                delete_method: "webspaceDelete",
                delete_id_param: "webspaceId",
                id_field: "webspaceId",
                name_field: "webspaceName",
                status_field: Some("webspaceStatus"),
            },
            Self::VirtualHost => ResourceDef {
                service: Service::Webhosting,
                find_method: "vhostsFind",
                delete_method: "vhostDelete",
                delete_id_param: "vhostId",
                id_field: "vHostId",
                name_field: "vHostDomainName",
                status_field: Some("vHostStatus"),
            },
            Self::Database => ResourceDef {
                service: Service::Database,
                find_method: "databasesFind",
                delete_method: "databaseDelete",
                delete_id_param: "databaseId",
                id_field: "databaseId",
                name_field: "databaseName",
                status_field: Some("databaseStatus"),
            },
            Self::DatabaseUser => ResourceDef {
                service: Service::Database,
                find_method: "usersFind",
                delete_method: "userDelete",
                delete_id_param: "userId",
                id_field: "userId",
                name_field: "userName",
                status_field: None,
            },
            Self::WorkspaceUser => ResourceDef {
                service: Service::Webhosting,
                find_method: "usersFind",
                delete_method: "userDelete",
                delete_id_param: "userId",
                id_field: "userId",
                name_field: "userName",
                status_field: None,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workspace => "webspace",
            Self::VirtualHost => "vhost",
            Self::Database => "database",
            Self::DatabaseUser => "database user",
            Self::WorkspaceUser => "webspace user",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider resource the locator can search for
pub trait Resource: DeserializeOwned + Send {
    const KIND: ResourceKind;

    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

impl Resource for Webspace {
    const KIND: ResourceKind = ResourceKind::Workspace;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for VirtualHost {
    const KIND: ResourceKind = ResourceKind::VirtualHost;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.domain_name
    }
}

impl Resource for Database {
    const KIND: ResourceKind = ResourceKind::Database;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for DatabaseUser {
    const KIND: ResourceKind = ResourceKind::DatabaseUser;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for WebspaceUser {
    const KIND: ResourceKind = ResourceKind::WorkspaceUser;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
