//! Deployment manifest
//!
//! Structured form of `.hosting/config.yaml`. Maps use [`IndexMap`] so that
//! location rules and cron jobs keep the order they have in the file.

use crate::error::{DeployError, Result};
use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Default manifest location, relative to the project root
pub const DEFAULT_MANIFEST_PATH: &str = ".hosting/config.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub project: Option<ProjectSection>,
    #[serde(default)]
    pub applications: IndexMap<String, ManifestApp>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSection {
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub prune: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestApp {
    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub php: Option<PhpSection>,
    #[serde(default)]
    pub env: IndexMap<String, ScalarValue>,
    /// Environment variable name -> logical database name
    #[serde(default)]
    pub databases: IndexMap<String, String>,
    /// Domain name -> web settings
    #[serde(default)]
    pub web: IndexMap<String, ManifestWeb>,
    #[serde(default)]
    pub crons: Vec<CronSpec>,
    #[serde(default)]
    pub redis: Option<bool>,
}

impl ManifestApp {
    pub fn php_version(&self) -> Option<&str> {
        self.php.as_ref().and_then(|php| php.version.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhpSection {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub ini: IndexMap<String, ScalarValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestWeb {
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub www: Option<bool>,
    #[serde(default)]
    pub locations: IndexMap<String, LocationSpec>,
}

/// A single location rule as written in the manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationSpec {
    #[serde(default)]
    pub passthru: Option<Passthru>,
    #[serde(default)]
    pub allow: Option<bool>,
    #[serde(default)]
    pub expires: Option<bool>,
}

/// `passthru` is either a script path or a boolean
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Passthru {
    Flag(bool),
    Script(String),
}

/// A cron entry: `php` or `cmd` command line, `every` and optional `on`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CronSpec {
    #[serde(default)]
    pub php: Option<String>,
    #[serde(default)]
    pub cmd: Option<String>,
    pub every: String,
    #[serde(default)]
    pub on: Option<ScalarValue>,
}

/// YAML scalar as found in `env`, `php.ini` and cron `on` values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl Manifest {
    /// Load and parse a manifest file
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Look up an application section
    pub fn app(&self, key: &str) -> Result<&ManifestApp> {
        self.applications.get(key).ok_or_else(|| {
            DeployError::Configuration(format!(
                "Cannot find \"applications.{}\" in the \"{}\" manifest.",
                key, DEFAULT_MANIFEST_PATH
            ))
        })
    }

    pub fn prune_enabled(&self) -> bool {
        self.project.as_ref().map(|p| p.prune).unwrap_or(false)
    }
}
