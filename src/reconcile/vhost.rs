//! Virtual host creation
//!
//! A vhost is created once per declared domain and never updated: the domain
//! is its identity, so a changed domain yields a new vhost.

use super::Reconciler;
use crate::api::models::{VirtualHost, Webspace};
use crate::api::Service;
use crate::error::Result;
use crate::manifest::{ManifestApp, ManifestWeb, ScalarValue};
use crate::report::{ActionType, DeploymentReport};
use crate::resource::ResourceKind;
use crate::routing::{self, RoutingRule};
use indexmap::IndexMap;
use serde::Serialize;

/// Directory the deployment artifact is unpacked to inside the webspace
pub const WEB_ROOT_PREFIX: &str = "current";
pub const SERVER_TYPE: &str = "nginx";
pub const TLS_PROFILE: &str = "modern";
pub const MANAGED_SSL_PRODUCT: &str = "ssl-letsencrypt-dv-3m";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VhostCreateRequest {
    pub vhost: NewVhost,
    pub php_ini: PhpIni,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVhost {
    pub domain_name: String,
    pub server_type: String,
    pub webspace_id: String,
    pub enable_alias: bool,
    pub redirect_to_primary_name: bool,
    pub redirect_http_to_https: bool,
    pub php_version: Option<String>,
    pub web_root: String,
    pub locations: Vec<RoutingRule>,
    pub ssl_settings: SslSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SslSettings {
    pub profile: String,
    pub managed_ssl_product_code: String,
}

impl Default for SslSettings {
    fn default() -> Self {
        Self {
            profile: TLS_PROFILE.to_string(),
            managed_ssl_product_code: MANAGED_SSL_PRODUCT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PhpIni {
    pub values: Vec<PhpIniValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhpIniValue {
    pub key: String,
    pub value: String,
}

/// `current/<root>` without a trailing separator
pub fn web_root(root: Option<&str>) -> String {
    let joined = format!("{}/{}", WEB_ROOT_PREFIX, root.unwrap_or(""));
    match joined.strip_suffix('/') {
        Some(trimmed) => trimmed.to_string(),
        None => joined,
    }
}

/// php.ini overrides as key/value pairs with stringified values
pub fn php_ini_values(ini: &IndexMap<String, ScalarValue>) -> Vec<PhpIniValue> {
    ini.iter()
        .map(|(key, value)| PhpIniValue {
            key: key.clone(),
            value: value.to_string(),
        })
        .collect()
}

pub fn build_create(
    webspace_id: &str,
    domain_name: &str,
    web: &ManifestWeb,
    app: &ManifestApp,
    php_version: Option<&str>,
) -> VhostCreateRequest {
    let ini = app
        .php
        .as_ref()
        .map(|php| php_ini_values(&php.ini))
        .unwrap_or_default();

    VhostCreateRequest {
        vhost: NewVhost {
            domain_name: domain_name.to_string(),
            server_type: SERVER_TYPE.to_string(),
            webspace_id: webspace_id.to_string(),
            enable_alias: web.www.unwrap_or(true),
            redirect_to_primary_name: true,
            redirect_http_to_https: true,
            php_version: php_version.map(str::to_string),
            web_root: web_root(web.root.as_deref()),
            locations: routing::compile(&web.locations),
            ssl_settings: SslSettings::default(),
        },
        php_ini: PhpIni { values: ini },
    }
}

impl Reconciler {
    /// Create the vhost for `domain_name` unless the webspace already has one
    pub async fn reconcile_vhost(
        &self,
        webspace: &Webspace,
        domain_name: &str,
        web: &ManifestWeb,
        app: &ManifestApp,
        report: &mut DeploymentReport,
    ) -> Result<VirtualHost> {
        let existing = self.locator().find_vhosts_by_workspace(&webspace.id).await?;
        if let Some(vhost) = existing.into_iter().find(|v| v.domain_name == domain_name) {
            report.record(ResourceKind::VirtualHost, &vhost.domain_name, &vhost.id, ActionType::Unchanged);
            return Ok(vhost);
        }

        let vhost = self.create_vhost(webspace, domain_name, web, app).await?;
        report.record(ResourceKind::VirtualHost, &vhost.domain_name, &vhost.id, ActionType::Created);
        Ok(vhost)
    }

    pub async fn create_vhost(
        &self,
        webspace: &Webspace,
        domain_name: &str,
        web: &ManifestWeb,
        app: &ManifestApp,
    ) -> Result<VirtualHost> {
        let request = build_create(&webspace.id, domain_name, web, app, self.php_version(app));
        tracing::info!(
            "Creating vhost {} in webspace {} with web root {}",
            domain_name,
            webspace.name,
            request.vhost.web_root
        );
        self.client()
            .execute(Service::Webhosting, "vhostCreate", &request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{LocationSpec, Passthru, PhpSection};
    use serde_json::json;

    #[test]
    fn test_web_root() {
        assert_eq!(web_root(None), "current");
        assert_eq!(web_root(Some("")), "current");
        assert_eq!(web_root(Some("public")), "current/public");
        assert_eq!(web_root(Some("public/")), "current/public");
        assert_eq!(web_root(Some("web/app")), "current/web/app");
    }

    #[test]
    fn test_php_ini_values_are_strings() {
        let mut ini = IndexMap::new();
        ini.insert("memory_limit".to_string(), ScalarValue::Str("256M".into()));
        ini.insert("display_errors".to_string(), ScalarValue::Bool(false));
        ini.insert("max_execution_time".to_string(), ScalarValue::Int(60));

        assert_eq!(
            serde_json::to_value(php_ini_values(&ini)).unwrap(),
            json!([
                {"key": "memory_limit", "value": "256M"},
                {"key": "display_errors", "value": "false"},
                {"key": "max_execution_time", "value": "60"}
            ])
        );
    }

    #[test]
    fn test_build_create_payload() {
        let mut locations = IndexMap::new();
        locations.insert(
            "/".to_string(),
            LocationSpec {
                passthru: Some(Passthru::Script("/index.php".into())),
                ..Default::default()
            },
        );
        let web = ManifestWeb {
            root: Some("public/".into()),
            www: None,
            locations,
        };
        let app = ManifestApp {
            php: Some(PhpSection {
                version: Some("8.2".into()),
                ini: IndexMap::new(),
            }),
            ..Default::default()
        };

        let request = build_create("ws-1", "example.com", &web, &app, Some("8.2"));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "vhost": {
                    "domainName": "example.com",
                    "serverType": "nginx",
                    "webspaceId": "ws-1",
                    "enableAlias": true,
                    "redirectToPrimaryName": true,
                    "redirectHttpToHttps": true,
                    "phpVersion": "8.2",
                    "webRoot": "current/public",
                    "locations": [
                        {"matchString": "/", "matchType": "directory", "locationType": "generic", "mapScript": "/index.php", "phpEnabled": true}
                    ],
                    "sslSettings": {"profile": "modern", "managedSslProductCode": "ssl-letsencrypt-dv-3m"}
                },
                "phpIni": {"values": []}
            })
        );
    }

    #[test]
    fn test_unset_php_version_is_null() {
        let request = build_create("ws-1", "example.com", &ManifestWeb::default(), &ManifestApp::default(), None);
        let value = serde_json::to_value(&request).unwrap();
        assert!(value["vhost"]["phpVersion"].is_null());
        assert_eq!(value["vhost"]["webRoot"], "current");
    }

    #[test]
    fn test_www_false_disables_alias() {
        let web = ManifestWeb {
            www: Some(false),
            ..Default::default()
        };
        let request = build_create("ws-1", "example.com", &web, &ManifestApp::default(), None);
        assert!(!request.vhost.enable_alias);
    }
}
