//! Configuration Management
//!
//! Persistent defaults for hostsync and the explicit settings handed to the
//! API client.

use crate::credential::Secret;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Provider API endpoint used when nothing else is configured
pub const DEFAULT_BASE_URI: &str = "https://secure.hosting.de/api";

/// Everything the API client needs, passed in at construction
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_uri: Url,
    pub auth_token: Secret,
}

impl ApiSettings {
    pub fn new(base_uri: &str, auth_token: Secret) -> Result<Self> {
        let base_uri = Url::parse(base_uri)
            .with_context(|| format!("Invalid API base URI: {}", base_uri))?;
        Ok(Self {
            base_uri,
            auth_token,
        })
    }
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Provider API endpoint
    #[serde(default)]
    pub base_uri: Option<String>,
    /// Project prefix for resource names
    #[serde(default)]
    pub project: Option<String>,
    /// PHP version used when the manifest does not pin one
    #[serde(default)]
    pub default_php_version: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("hostsync").join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a file, falling back to defaults when the
    /// file is missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Get effective base URI (CLI > config > built-in default)
    pub fn effective_base_uri(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| self.base_uri.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URI.to_string())
    }

    /// Project prefix set explicitly (CLI > config), no fallback
    pub fn configured_project(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.project.clone())
            .filter(|p| !p.is_empty())
    }

    /// Get effective project prefix (CLI > config > current directory name)
    pub fn effective_project(&self, cli: Option<&str>) -> Option<String> {
        if let Some(project) = self.configured_project(cli) {
            return Some(project);
        }

        let fallback = std::env::current_dir()
            .ok()
            .and_then(|dir| dir.file_name().map(|n| n.to_string_lossy().to_string()))
            .filter(|p| !p.is_empty())?;
        tracing::warn!(
            "No project configured, using the current directory name {:?} as project prefix",
            fallback
        );
        Some(fallback)
    }

    /// Get effective default PHP version (CLI/env > config)
    pub fn effective_php_version(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.default_php_version.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_uri_precedence() {
        let config = Config {
            base_uri: Some("https://sandbox.example/api".into()),
            ..Default::default()
        };
        assert_eq!(
            config.effective_base_uri(Some("http://localhost:1234")),
            "http://localhost:1234"
        );
        assert_eq!(config.effective_base_uri(None), "https://sandbox.example/api");
        assert_eq!(Config::default().effective_base_uri(None), DEFAULT_BASE_URI);
    }

    #[test]
    fn test_project_precedence() {
        let config = Config {
            project: Some("from-config".into()),
            ..Default::default()
        };
        assert_eq!(config.effective_project(Some("cli")).as_deref(), Some("cli"));
        assert_eq!(config.effective_project(None).as_deref(), Some("from-config"));
    }

    #[test]
    fn test_configured_project_has_no_directory_fallback() {
        assert_eq!(Config::default().configured_project(None), None);
        assert_eq!(Config::default().configured_project(Some("")), None);
        assert_eq!(
            Config::default().configured_project(Some("shop")).as_deref(),
            Some("shop")
        );
    }

    #[test]
    fn test_effective_project_falls_back_to_directory() {
        let expected = std::env::current_dir()
            .unwrap()
            .file_name()
            .map(|n| n.to_string_lossy().to_string());
        assert_eq!(Config::default().effective_project(None), expected);
    }

    #[test]
    fn test_php_version_precedence() {
        let config = Config {
            default_php_version: Some("8.1".into()),
            ..Default::default()
        };
        assert_eq!(config.effective_php_version(Some("8.3")).as_deref(), Some("8.3"));
        assert_eq!(config.effective_php_version(None).as_deref(), Some("8.1"));
        assert_eq!(Config::default().effective_php_version(None), None);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let config = Config::load_from(Path::new("/nonexistent/hostsync/config.json"));
        assert!(config.base_uri.is_none());
    }

    #[test]
    fn test_api_settings_rejects_invalid_uri() {
        assert!(ApiSettings::new("not a url", Secret::new("t")).is_err());
        assert!(ApiSettings::new(DEFAULT_BASE_URI, Secret::new("t")).is_ok());
    }
}
