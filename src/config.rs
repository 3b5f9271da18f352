use std::time::Duration;

use anyhow::Context;

use crate::evaluator::GRADE_ALERT_THRESHOLD;

pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api/notifications";
pub const DEFAULT_PUSH_API_BASE: &str = "http://localhost:8080/api/push-notifications";

#[derive(Debug, Clone, PartialEq)]
pub struct NotifierConfig {
    pub api_base: String,
    pub push_api_base: String,
    pub push_enabled: bool,
    pub push_auto_enable: bool,
    pub alert_threshold: f64,
    pub request_timeout: Option<Duration>,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            push_api_base: DEFAULT_PUSH_API_BASE.to_string(),
            push_enabled: false,
            push_auto_enable: true,
            alert_threshold: GRADE_ALERT_THRESHOLD,
            request_timeout: None,
        }
    }
}

impl NotifierConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_base = var("GRADEGOAL_API_BASE").unwrap_or(defaults.api_base);
        let push_api_base = var("GRADEGOAL_PUSH_API_BASE").unwrap_or(defaults.push_api_base);

        let push_enabled = match var("GRADEGOAL_PUSH_ENABLED") {
            Some(value) => parse_flag(&value).context("GRADEGOAL_PUSH_ENABLED must be a boolean")?,
            None => defaults.push_enabled,
        };
        let push_auto_enable = match var("GRADEGOAL_PUSH_AUTO_ENABLE") {
            Some(value) => {
                parse_flag(&value).context("GRADEGOAL_PUSH_AUTO_ENABLE must be a boolean")?
            }
            None => defaults.push_auto_enable,
        };

        let alert_threshold = match var("GRADEGOAL_ALERT_THRESHOLD") {
            Some(value) => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|threshold| threshold.is_finite())
                .with_context(|| format!("GRADEGOAL_ALERT_THRESHOLD is not a number: {value}"))?,
            None => defaults.alert_threshold,
        };

        let request_timeout = match var("GRADEGOAL_HTTP_TIMEOUT_SECS") {
            Some(value) => Some(Duration::from_secs(value.trim().parse().with_context(
                || format!("GRADEGOAL_HTTP_TIMEOUT_SECS must be whole seconds: {value}"),
            )?)),
            None => None,
        };

        Ok(Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            push_api_base: push_api_base.trim().trim_end_matches('/').to_string(),
            push_enabled,
            push_auto_enable,
            alert_threshold,
            request_timeout,
        })
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("unrecognized flag value {other:?}"),
    }
}
