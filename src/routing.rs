//! Routing rule compiler
//!
//! Turns manifest `locations` into provider vhost location records.

use crate::manifest::{LocationSpec, Passthru};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    Regex,
    Directory,
    #[default]
    Default,
}

impl MatchType {
    /// Inferred from the first character of the match string only
    pub fn infer(match_string: &str) -> Self {
        if match_string.starts_with('^') {
            Self::Regex
        } else if match_string.starts_with('/') {
            Self::Directory
        } else {
            Self::Default
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocationType {
    #[default]
    Generic,
    BlockAccess,
}

/// Where matching requests are handed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Passthrough {
    /// Explicit front controller script
    Script(String),
    /// No script execution at all
    Disabled,
    /// Script execution on, handled by the webspace default handler
    DefaultHandler,
}

impl Passthrough {
    pub fn from_spec(passthru: Option<&Passthru>) -> Self {
        match passthru {
            Some(Passthru::Script(path)) => Self::Script(path.clone()),
            Some(Passthru::Flag(false)) => Self::Disabled,
            Some(Passthru::Flag(true)) | None => Self::DefaultHandler,
        }
    }

    pub fn map_script(&self) -> &str {
        match self {
            Self::Script(path) => path,
            Self::Disabled | Self::DefaultHandler => "",
        }
    }

    pub fn php_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Provider vhost location record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRule {
    pub match_string: String,
    #[serde(default)]
    pub match_type: MatchType,
    #[serde(default)]
    pub location_type: LocationType,
    #[serde(default)]
    pub map_script: String,
    #[serde(default)]
    pub php_enabled: bool,
}

impl RoutingRule {
    pub fn compile(match_string: &str, spec: &LocationSpec) -> Self {
        let passthrough = Passthrough::from_spec(spec.passthru.as_ref());
        let location_type = if spec.allow == Some(false) {
            LocationType::BlockAccess
        } else {
            LocationType::Generic
        };

        Self {
            match_string: match_string.to_string(),
            match_type: MatchType::infer(match_string),
            location_type,
            map_script: passthrough.map_script().to_string(),
            php_enabled: passthrough.php_enabled(),
        }
    }
}

/// Compile all location rules of a web section, in manifest order
pub fn compile(locations: &IndexMap<String, LocationSpec>) -> Vec<RoutingRule> {
    locations
        .iter()
        .map(|(match_string, spec)| RoutingRule::compile(match_string, spec))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loc(passthru: Option<Passthru>, allow: Option<bool>) -> LocationSpec {
        LocationSpec {
            passthru,
            allow,
            expires: None,
        }
    }

    #[test]
    fn test_match_type_inference() {
        assert_eq!(MatchType::infer("^/api"), MatchType::Regex);
        assert_eq!(MatchType::infer("/assets"), MatchType::Directory);
        assert_eq!(MatchType::infer("index"), MatchType::Default);
        assert_eq!(MatchType::infer(""), MatchType::Default);
        assert_eq!(MatchType::infer("\\.php$"), MatchType::Default);
    }

    #[test]
    fn test_passthru_script() {
        let rule = RoutingRule::compile("/", &loc(Some(Passthru::Script("/app.php".into())), None));
        assert_eq!(rule.map_script, "/app.php");
        assert!(rule.php_enabled);
    }

    #[test]
    fn test_passthru_false_disables_scripts() {
        let rule = RoutingRule::compile("/", &loc(Some(Passthru::Flag(false)), None));
        assert_eq!(rule.map_script, "");
        assert!(!rule.php_enabled);
    }

    #[test]
    fn test_passthru_absent_uses_default_handler() {
        let rule = RoutingRule::compile("/", &loc(None, None));
        assert_eq!(rule.map_script, "");
        assert!(rule.php_enabled);

        let rule = RoutingRule::compile("/", &loc(Some(Passthru::Flag(true)), None));
        assert_eq!(rule.map_script, "");
        assert!(rule.php_enabled);
    }

    #[test]
    fn test_allow_false_blocks_access() {
        assert_eq!(
            RoutingRule::compile("/", &loc(None, Some(false))).location_type,
            LocationType::BlockAccess
        );
        assert_eq!(
            RoutingRule::compile("/", &loc(None, Some(true))).location_type,
            LocationType::Generic
        );
        assert_eq!(
            RoutingRule::compile("/", &loc(None, None)).location_type,
            LocationType::Generic
        );
    }

    #[test]
    fn test_compile_preserves_order_and_encoding() {
        let mut locations = IndexMap::new();
        locations.insert("index".to_string(), loc(None, Some(false)));
        locations.insert("^/api".to_string(), loc(Some(Passthru::Script("/index.php".into())), None));
        locations.insert("/assets".to_string(), loc(Some(Passthru::Flag(false)), None));

        let rules = compile(&locations);
        assert_eq!(
            serde_json::to_value(&rules).unwrap(),
            json!([
                {"matchString": "index", "matchType": "default", "locationType": "blockAccess", "mapScript": "", "phpEnabled": true},
                {"matchString": "^/api", "matchType": "regex", "locationType": "generic", "mapScript": "/index.php", "phpEnabled": true},
                {"matchString": "/assets", "matchType": "directory", "locationType": "generic", "mapScript": "", "phpEnabled": false}
            ])
        );
    }
}
