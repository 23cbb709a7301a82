//! Resource Locator
//!
//! Finds existing provider resources by name, name prefix or id. Name based
//! lookups only see active resources; an exact-name lookup that matches more
//! than one of them is an error rather than a guess.

use super::kind::{Resource, ResourceKind};
use crate::api::models::{DatabaseUser, VirtualHost, WebspaceUser};
use crate::api::{ApiClient, Filter, FindQuery};
use crate::error::{DeployError, Result};

/// Status value of resources the engine is allowed to see
pub const ACTIVE: &str = "active";

/// Upper bound on pages fetched by a listing, guards against a provider that
/// keeps reporting more pages
const MAX_PAGES: u32 = 100;

/// Read-only lookups against the provider
#[derive(Clone, Copy)]
pub struct Locator<'a> {
    client: &'a ApiClient,
}

impl<'a> Locator<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// All active resources whose name starts with `{prefix}-`
    pub async fn find_by_prefix<T: Resource>(&self, prefix: &str) -> Result<Vec<T>> {
        let kind = T::KIND;
        let filter = name_filter(kind, format!("{}-*", prefix));
        self.find_all(kind, filter).await
    }

    /// The single active resource named `name`.
    ///
    /// Fails with [`DeployError::AmbiguousMatch`] when the provider reports
    /// more than one match.
    pub async fn find_one_by_name<T: Resource>(&self, name: &str) -> Result<Option<T>> {
        let kind = T::KIND;
        let def = kind.def();
        let query = FindQuery::new(name_filter(kind, name.to_string())).limit(1);

        let page = self.client.find::<T>(def.service, def.find_method, &query).await?;

        let total = page.total();
        if total > 1 {
            tracing::error!("{} active {} resources named {:?}", total, kind, name);
            return Err(DeployError::AmbiguousMatch {
                kind,
                name: name.to_string(),
                count: total,
            });
        }

        Ok(page.data.into_iter().next())
    }

    /// Direct lookup by provider id, regardless of status
    pub async fn find_by_id<T: Resource>(&self, id: &str) -> Result<Option<T>> {
        let def = T::KIND.def();
        let query = FindQuery::new(Filter::field(def.id_field, id)).limit(1);

        let page = self.client.find::<T>(def.service, def.find_method, &query).await?;
        Ok(page.data.into_iter().next())
    }

    /// Active virtual hosts attached to a webspace
    pub async fn find_vhosts_by_workspace(&self, webspace_id: &str) -> Result<Vec<VirtualHost>> {
        let filter = Filter::all(vec![
            Filter::field("webspaceId", webspace_id),
            Filter::field("vHostStatus", ACTIVE),
        ]);
        self.find_all(ResourceKind::VirtualHost, filter).await
    }

    /// Database users named `user_name` that hold an access on `database_id`
    pub async fn find_database_accesses(
        &self,
        user_name: &str,
        database_id: &str,
    ) -> Result<Vec<DatabaseUser>> {
        let filter = Filter::all(vec![
            Filter::field("userName", user_name),
            Filter::field("userAccessesDatabaseId", database_id),
        ]);
        self.find_all(ResourceKind::DatabaseUser, filter).await
    }

    /// Webspace users created by this tool, recognized by their name prefix
    pub async fn find_managed_webspace_users(&self, user_prefix: &str) -> Result<Vec<WebspaceUser>> {
        let filter = Filter::field("userName", format!("{}*", user_prefix));
        self.find_all(ResourceKind::WorkspaceUser, filter).await
    }

    /// Fetch every page of a find call
    async fn find_all<T: Resource>(&self, kind: ResourceKind, filter: Filter) -> Result<Vec<T>> {
        let def = kind.def();
        let mut items = Vec::new();
        let mut page_number = 1;

        loop {
            let query = FindQuery::new(filter.clone()).page(page_number);
            let page = self.client.find::<T>(def.service, def.find_method, &query).await?;
            let fetched = page.data.len();
            items.extend(page.data);

            if fetched == 0 || u64::from(page_number) >= page.total_pages || page_number >= MAX_PAGES {
                break;
            }
            page_number += 1;
        }

        tracing::debug!("{} returned {} {} resources", def.find_method, items.len(), kind);
        Ok(items)
    }
}

/// Name condition, combined with the active-status condition when the kind has one
fn name_filter(kind: ResourceKind, name: String) -> Filter {
    let def = kind.def();
    let mut conditions = vec![Filter::field(def.name_field, name)];
    if let Some(status_field) = def.status_field {
        conditions.push(Filter::field(status_field, ACTIVE));
    }
    Filter::all(conditions)
}
