//! Schedule encoder
//!
//! Translates manifest cron entries into the provider's cron job records.
//! The output is a total function of the input so that encoding an unchanged
//! manifest produces a job list equal to the one already stored remotely.

use crate::error::{DeployError, Result};
use crate::manifest::{CronSpec, ScalarValue};
use crate::api::models::nullable;
use serde::{Deserialize, Serialize};

pub const CRON_COMMENT: &str = "Created by hostsync. Please do not change.";

pub const DEFAULT_WEEKDAY: &str = "mon";
pub const DEFAULT_DAY_OF_MONTH: u32 = 1;
pub const DEFAULT_DAYPART: &str = "1-5";

/// Provider cron job record.
///
/// Stored jobs may carry `null` where a fresh encoding has a neutral value.
/// Every field is always serialized, `null` included, so two jobs that mean
/// the same thing compare and serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CronJob {
    /// `php` or `bash`
    #[serde(rename = "type")]
    #[serde(deserialize_with = "nullable")]
    pub kind: String,
    #[serde(deserialize_with = "nullable")]
    pub comments: String,
    /// Script path or executable, the first token of the command line
    #[serde(deserialize_with = "nullable")]
    pub script: String,
    #[serde(deserialize_with = "nullable")]
    pub parameters: Vec<String>,
    #[serde(deserialize_with = "nullable")]
    pub url: String,
    /// Only set for PHP jobs
    pub interpreter_version: Option<String>,
    /// `daily`, `weekly` or `monthly`
    #[serde(deserialize_with = "nullable")]
    pub schedule: String,
    #[serde(deserialize_with = "nullable")]
    pub weekday: String,
    #[serde(deserialize_with = "nullable")]
    pub day_of_month: u32,
    #[serde(deserialize_with = "nullable")]
    pub hour: u32,
    #[serde(deserialize_with = "nullable")]
    pub minute: u32,
    pub daypart: Option<String>,
}

impl Default for CronJob {
    /// The neutral job: empty strings, empty lists, zero numbers and `null`
    /// for the optional interpreter version and daypart.
    fn default() -> Self {
        Self {
            kind: String::new(),
            comments: String::new(),
            script: String::new(),
            parameters: Vec::new(),
            url: String::new(),
            interpreter_version: None,
            schedule: String::new(),
            weekday: String::new(),
            day_of_month: 0,
            hour: 0,
            minute: 0,
            daypart: None,
        }
    }
}

/// Map the manifest recurrence token to the provider granularity.
/// Unknown tokens are passed through for the provider to reject.
pub fn granularity(every: &str) -> &str {
    match every {
        "day" => "daily",
        "week" => "weekly",
        "month" => "monthly",
        other => other,
    }
}

/// Encode one manifest cron entry.
///
/// `interpreter_version` is attached to PHP jobs only.
pub fn encode(spec: &CronSpec, interpreter_version: Option<&str>) -> Result<CronJob> {
    let mut job = CronJob::default();

    let (kind, command_line) = match (spec.php.as_deref(), spec.cmd.as_deref()) {
        (Some(php), None) => ("php", php),
        (None, Some(cmd)) => ("bash", cmd),
        (Some(_), Some(_)) => {
            return Err(DeployError::Validation(
                "cron job must configure either \"php\" or \"cmd\", not both".to_string(),
            ))
        }
        (None, None) => {
            return Err(DeployError::Validation(
                "script or command required: configure either \"php\" or \"cmd\" for the cron job"
                    .to_string(),
            ))
        }
    };

    let mut tokens = command_line.split_whitespace().map(str::to_string);
    let Some(script) = tokens.next() else {
        return Err(DeployError::Validation(format!(
            "cron job \"{}\" command line is empty",
            kind
        )));
    };

    job.kind = kind.to_string();
    job.script = script;
    job.parameters = tokens.collect();
    if kind == "php" {
        job.interpreter_version = interpreter_version.map(str::to_string);
    }
    job.comments = CRON_COMMENT.to_string();
    job.schedule = granularity(&spec.every).to_string();

    match job.schedule.as_str() {
        "weekly" => {
            job.weekday = spec
                .on
                .as_ref()
                .map(|on| on.to_string().to_lowercase())
                .unwrap_or_else(|| DEFAULT_WEEKDAY.to_string());
        }
        "monthly" => {
            job.day_of_month = match &spec.on {
                Some(on) => day_of_month(on)?,
                None => DEFAULT_DAY_OF_MONTH,
            };
        }
        "daily" => {
            job.daypart = Some(
                spec.on
                    .as_ref()
                    .map(|on| on.to_string())
                    .unwrap_or_else(|| DEFAULT_DAYPART.to_string()),
            );
        }
        _ => {}
    }

    Ok(job)
}

/// Encode every cron entry of an application, keeping manifest order
pub fn encode_all(specs: &[CronSpec], interpreter_version: Option<&str>) -> Result<Vec<CronJob>> {
    specs
        .iter()
        .map(|spec| encode(spec, interpreter_version))
        .collect()
}

fn day_of_month(on: &ScalarValue) -> Result<u32> {
    let day = match on {
        ScalarValue::Int(n) => u32::try_from(*n).ok(),
        ScalarValue::Str(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };

    match day {
        Some(day) if (1..=31).contains(&day) => Ok(day),
        _ => Err(DeployError::Validation(format!(
            "monthly cron job needs a day of month between 1 and 31, got \"{}\"",
            on
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(php: Option<&str>, cmd: Option<&str>, every: &str, on: Option<ScalarValue>) -> CronSpec {
        CronSpec {
            php: php.map(str::to_string),
            cmd: cmd.map(str::to_string),
            every: every.to_string(),
            on,
        }
    }

    #[test]
    fn test_weekly_uses_lowercased_weekday() {
        let job = encode(
            &spec(Some("bin/console app:cleanup"), None, "week", Some(ScalarValue::Str("Fri".into()))),
            None,
        )
        .unwrap();
        assert_eq!(job.schedule, "weekly");
        assert_eq!(job.weekday, "fri");
        assert_eq!(job.day_of_month, 0);
        assert_eq!(job.daypart, None);
    }

    #[test]
    fn test_weekly_defaults_to_monday() {
        let job = encode(&spec(None, Some("backup.sh"), "week", None), None).unwrap();
        assert_eq!(job.weekday, DEFAULT_WEEKDAY);
    }

    #[test]
    fn test_monthly_defaults_to_first_day() {
        let job = encode(&spec(None, Some("report.sh"), "month", None), None).unwrap();
        assert_eq!(job.schedule, "monthly");
        assert_eq!(job.day_of_month, 1);
        assert_eq!(job.weekday, "");
        assert_eq!(job.daypart, None);
    }

    #[test]
    fn test_monthly_accepts_numeric_strings() {
        let job = encode(
            &spec(None, Some("report.sh"), "month", Some(ScalarValue::Str("15".into()))),
            None,
        )
        .unwrap();
        assert_eq!(job.day_of_month, 15);

        let job = encode(&spec(None, Some("report.sh"), "month", Some(ScalarValue::Int(28))), None)
            .unwrap();
        assert_eq!(job.day_of_month, 28);
    }

    #[test]
    fn test_monthly_rejects_non_numeric_day() {
        let err = encode(
            &spec(None, Some("report.sh"), "month", Some(ScalarValue::Str("Fri".into()))),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::Validation(_)));
    }

    #[test]
    fn test_daily_daypart() {
        let job = encode(&spec(None, Some("sync.sh"), "day", None), None).unwrap();
        assert_eq!(job.schedule, "daily");
        assert_eq!(job.daypart.as_deref(), Some("1-5"));

        let job = encode(
            &spec(None, Some("sync.sh"), "day", Some(ScalarValue::Str("0-23".into()))),
            None,
        )
        .unwrap();
        assert_eq!(job.daypart.as_deref(), Some("0-23"));
    }

    #[test]
    fn test_unknown_granularity_passes_through() {
        let job = encode(&spec(None, Some("x.sh"), "hourly", None), None).unwrap();
        assert_eq!(job.schedule, "hourly");
        assert_eq!(job.weekday, "");
        assert_eq!(job.day_of_month, 0);
        assert_eq!(job.daypart, None);
    }

    #[test]
    fn test_command_line_split() {
        let job = encode(
            &spec(Some("bin/console  messenger:consume   --limit=10"), None, "day", None),
            Some("8.2"),
        )
        .unwrap();
        assert_eq!(job.kind, "php");
        assert_eq!(job.script, "bin/console");
        assert_eq!(job.parameters, vec!["messenger:consume", "--limit=10"]);
        assert_eq!(job.interpreter_version.as_deref(), Some("8.2"));
    }

    #[test]
    fn test_interpreter_version_only_for_php() {
        let job = encode(&spec(None, Some("bash run.sh"), "day", None), Some("8.2")).unwrap();
        assert_eq!(job.kind, "bash");
        assert_eq!(job.interpreter_version, None);
    }

    #[test]
    fn test_script_or_command_required() {
        let err = encode(&spec(None, None, "day", None), None).unwrap_err();
        assert!(err.to_string().contains("script or command required"));

        let err = encode(&spec(Some("a.php"), Some("b.sh"), "day", None), None).unwrap_err();
        assert!(matches!(err, DeployError::Validation(_)));

        let err = encode(&spec(Some("   "), None, "day", None), None).unwrap_err();
        assert!(matches!(err, DeployError::Validation(_)));
    }

    #[test]
    fn test_every_field_is_serialized() {
        let job = encode(&spec(None, Some("x.sh"), "week", None), None).unwrap();
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "bash",
                "comments": CRON_COMMENT,
                "script": "x.sh",
                "parameters": [],
                "url": "",
                "interpreterVersion": null,
                "schedule": "weekly",
                "weekday": "mon",
                "dayOfMonth": 0,
                "hour": 0,
                "minute": 0,
                "daypart": null
            })
        );
    }

    #[test]
    fn test_stored_nulls_read_as_defaults() {
        let stored: CronJob = serde_json::from_value(json!({
            "type": "bash",
            "script": "x.sh",
            "weekday": null,
            "dayOfMonth": null,
            "parameters": null,
            "schedule": "daily",
            "daypart": "1-5"
        }))
        .unwrap();
        assert_eq!(stored.weekday, "");
        assert_eq!(stored.day_of_month, 0);
        assert!(stored.parameters.is_empty());
        assert_eq!(stored.url, "");
    }

    #[test]
    fn test_stored_job_compares_equal_to_fresh_encoding() {
        let fresh = encode(&spec(Some("cron.php"), None, "day", None), Some("8.3")).unwrap();
        let stored: CronJob = serde_json::from_value(serde_json::to_value(&fresh).unwrap()).unwrap();
        assert_eq!(fresh, stored);
    }
}
