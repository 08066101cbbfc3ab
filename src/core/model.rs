// relayctl - core/model.rs
//
// Core data model types. Pure data definitions plus the in-memory mutations
// that keep `ConfigRecord` consistent. No I/O, no network.
//
// These types are the shared vocabulary across all layers.

use crate::util::constants;
use crate::util::error::{ConfigError, Subject};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// =============================================================================
// ConfigRecord
// =============================================================================

/// The resolved settings for one profile.
///
/// Persisted as one flat TOML document per profile. Absent keys fall back to
/// the defaults declared here, never to runtime lookups.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigRecord {
    /// Profile identifier, unique within the store.
    pub name: String,

    /// Identity captured at login.
    pub email: String,
    pub user_id: String,
    pub user_name: String,

    /// Secret bearer credential. `None` means "never configured".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base address of the relay service.
    pub api_url: String,

    /// Stable inbound webhook URL issued by the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permanent_url: Option<String>,

    /// Environment currently receiving webhooks. Always a key of `endpoints`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_environment: Option<String>,

    /// Environment name -> destination URL. A BTreeMap so every "first
    /// remaining" choice is lexical and reproducible.
    pub endpoints: BTreeMap<String, String>,
}

impl Default for ConfigRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            user_id: String::new(),
            user_name: String::new(),
            api_key: None,
            api_url: constants::DEFAULT_API_URL.to_string(),
            permanent_url: None,
            current_environment: None,
            endpoints: BTreeMap::new(),
        }
    }
}

// Hand-written so the API key never reaches a log line.
impl fmt::Debug for ConfigRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigRecord")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("user_id", &self.user_id)
            .field("user_name", &self.user_name)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("permanent_url", &self.permanent_url)
            .field("current_environment", &self.current_environment)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl ConfigRecord {
    /// Create an empty record for `name` with default API URL.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// True when an API key is present and non-empty.
    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Destination URL of the current environment, if any.
    pub fn current_endpoint(&self) -> Option<&str> {
        self.current_environment
            .as_deref()
            .and_then(|env| self.endpoints.get(env))
            .map(String::as_str)
    }

    /// Add or replace the destination URL for `environment`.
    ///
    /// The first environment added to a record with no current environment
    /// becomes current.
    pub fn set_endpoint(&mut self, environment: &str, url: &str) -> Result<(), ConfigError> {
        if environment.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "environment",
                value: environment.to_string(),
                expected: "a non-empty environment name".to_string(),
            });
        }
        if !crate::core::filter::is_http_url(url) {
            return Err(ConfigError::InvalidValue {
                field: "url",
                value: url.to_string(),
                expected: "an absolute http:// or https:// URL".to_string(),
            });
        }

        self.endpoints
            .insert(environment.to_string(), url.to_string());
        if self.current_environment.is_none() {
            self.current_environment = Some(environment.to_string());
        }
        Ok(())
    }

    /// Remove `environment`, repairing `current_environment` if it pointed
    /// there. Returns the removed URL.
    pub fn remove_endpoint(&mut self, environment: &str) -> Result<String, ConfigError> {
        let url = self
            .endpoints
            .remove(environment)
            .ok_or_else(|| ConfigError::environment_not_found(environment))?;
        self.repair_current_environment();
        Ok(url)
    }

    /// Rename an environment, keeping its URL and the current pointer.
    pub fn rename_endpoint(&mut self, old: &str, new: &str) -> Result<(), ConfigError> {
        if !self.endpoints.contains_key(old) {
            return Err(ConfigError::environment_not_found(old));
        }
        if self.endpoints.contains_key(new) {
            return Err(ConfigError::AlreadyExists {
                subject: Subject::Environment,
                name: new.to_string(),
            });
        }
        if new.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "environment",
                value: new.to_string(),
                expected: "a non-empty environment name".to_string(),
            });
        }

        if let Some(url) = self.endpoints.remove(old) {
            self.endpoints.insert(new.to_string(), url);
        }
        if self.current_environment.as_deref() == Some(old) {
            self.current_environment = Some(new.to_string());
        }
        Ok(())
    }

    /// Make `environment` the current environment.
    pub fn switch_environment(&mut self, environment: &str) -> Result<(), ConfigError> {
        if !self.endpoints.contains_key(environment) {
            return Err(ConfigError::environment_not_found(environment));
        }
        self.current_environment = Some(environment.to_string());
        Ok(())
    }

    /// Enforce "current_environment is a key of endpoints".
    ///
    /// A dangling pointer moves to the lexicographically first remaining
    /// environment, or is cleared when none remain. Returns true if anything
    /// changed.
    pub fn repair_current_environment(&mut self) -> bool {
        match self.current_environment.as_deref() {
            Some(env) if self.endpoints.contains_key(env) => false,
            Some(_) => {
                self.current_environment = self.endpoints.keys().next().cloned();
                true
            }
            None => false,
        }
    }
}

// =============================================================================
// Delivery logs
// =============================================================================

/// Delivery state reported by the relay service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    Failed,
    Pending,
    Retrying,
    DeadLetter,
    #[default]
    #[serde(other)]
    Unknown,
}

impl DeliveryStatus {
    /// Wire form used in the `status` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Pending => "pending",
            Self::Retrying => "retrying",
            Self::DeadLetter => "dead_letter",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One delivery event from the service's log endpoint. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the delivery happened.
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub status: DeliveryStatus,
    #[serde(default)]
    pub webhook_id: String,
    /// HTTP status returned by the destination, if it answered.
    #[serde(default)]
    pub response_code: Option<u16>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// Envelope of `GET /user/{id}/webhook/logs`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogsResponse {
    pub logs: Vec<LogEntry>,
}

/// Parameters of a log fetch. All filters are conjunctive; `None` means
/// "not sent". The client transmits them verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub limit: u32,
    pub environment: Option<String>,
    pub status: Option<DeliveryStatus>,
    pub webhook_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            limit: constants::DEFAULT_LOG_LIMIT,
            environment: None,
            status: None,
            webhook_id: None,
            start_date: None,
            end_date: None,
        }
    }
}

impl LogQuery {
    /// Query for the `limit` most recent entries, optionally in one environment.
    pub fn recent(limit: u32, environment: Option<String>) -> Self {
        Self {
            limit,
            environment,
            ..Default::default()
        }
    }

    /// Query-string pairs in a fixed order, omitting unset filters.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("limit", self.limit.to_string())];
        if let Some(env) = &self.environment {
            params.push(("environment", env.clone()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(id) = &self.webhook_id {
            params.push(("webhook_id", id.clone()));
        }
        if let Some(start) = &self.start_date {
            params.push(("start_date", start.clone()));
        }
        if let Some(end) = &self.end_date {
            params.push(("end_date", end.clone()));
        }
        params
    }
}

// =============================================================================
// Service responses
// =============================================================================

/// `GET /user/me`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub permanent_url: Option<String>,
}

/// Per-environment health inside `WebhookStatus`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentHealth {
    pub status: Option<String>,
    pub last_success: Option<String>,
    pub success_rate: f64,
}

/// `GET /user/{id}/webhook/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookStatus {
    pub total_webhooks: u64,
    pub successful: u64,
    pub failed: u64,
    pub pending: u64,
    pub success_rate: f64,
    pub avg_response_time: f64,
    pub environments: HashMap<String, EnvironmentHealth>,
}

/// One day inside `Metrics::daily_stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyStats {
    pub date: String,
    pub total_webhooks: u64,
    pub success_rate: f64,
    pub avg_response_time: f64,
}

/// `GET /user/{id}/metrics?days=N`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metrics {
    pub total_webhooks: u64,
    pub successful: u64,
    pub failed: u64,
    pub success_rate: f64,
    pub avg_response_time: f64,
    pub min_response_time: f64,
    pub max_response_time: f64,
    pub error_breakdown: HashMap<String, u64>,
    pub daily_stats: Vec<DailyStats>,
}

/// An environment as the service knows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteEnvironment {
    pub name: String,
    pub url: Option<String>,
    pub status: Option<String>,
}

/// Envelope of `GET /user/{id}/environments`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EnvironmentsResponse {
    pub environments: Vec<RemoteEnvironment>,
}

// =============================================================================
// Unit tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(envs: &[(&str, &str)]) -> ConfigRecord {
        let mut r = ConfigRecord::new("work");
        for (env, url) in envs {
            r.set_endpoint(env, url).unwrap();
        }
        r
    }

    #[test]
    fn first_endpoint_becomes_current() {
        let r = record_with(&[("dev", "https://dev.local"), ("prod", "https://prod.local")]);
        assert_eq!(r.current_environment.as_deref(), Some("dev"));
        assert_eq!(r.current_endpoint(), Some("https://dev.local"));
    }

    #[test]
    fn set_endpoint_rejects_non_http_url() {
        let mut r = ConfigRecord::new("work");
        let err = r.set_endpoint("dev", "ftp://x").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "url", .. }));
        assert!(r.endpoints.is_empty());
        assert!(r.current_environment.is_none());
    }

    /// Removing the only environment clears the pointer.
    #[test]
    fn removing_last_environment_clears_current() {
        let mut r = record_with(&[("dev", "https://x")]);
        assert_eq!(r.current_environment.as_deref(), Some("dev"));

        r.remove_endpoint("dev").unwrap();
        assert!(r.current_environment.is_none());
        assert!(r.endpoints.is_empty());
    }

    /// Removing the current environment picks the lexically first survivor.
    #[test]
    fn removing_current_environment_picks_lexical_first() {
        let mut r = record_with(&[
            ("staging", "https://s"),
            ("prod", "https://p"),
            ("dev", "https://d"),
        ]);
        r.switch_environment("staging").unwrap();

        r.remove_endpoint("staging").unwrap();
        assert_eq!(r.current_environment.as_deref(), Some("dev"));
    }

    #[test]
    fn removing_other_environment_keeps_current() {
        let mut r = record_with(&[("dev", "https://d"), ("prod", "https://p")]);
        r.switch_environment("prod").unwrap();
        r.remove_endpoint("dev").unwrap();
        assert_eq!(r.current_environment.as_deref(), Some("prod"));
    }

    #[test]
    fn remove_missing_environment_is_not_found() {
        let mut r = record_with(&[("dev", "https://d")]);
        let err = r.remove_endpoint("qa").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotFound {
                subject: Subject::Environment,
                ..
            }
        ));
    }

    #[test]
    fn rename_carries_current_pointer() {
        let mut r = record_with(&[("dev", "https://d")]);
        r.rename_endpoint("dev", "local").unwrap();
        assert_eq!(r.current_environment.as_deref(), Some("local"));
        assert_eq!(r.endpoints.get("local").map(String::as_str), Some("https://d"));
        assert!(!r.endpoints.contains_key("dev"));
    }

    #[test]
    fn rename_onto_existing_environment_fails_unchanged() {
        let mut r = record_with(&[("dev", "https://d"), ("prod", "https://p")]);
        let before = r.clone();
        let err = r.rename_endpoint("dev", "prod").unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists { .. }));
        assert_eq!(r, before);
    }

    #[test]
    fn switch_to_unknown_environment_fails() {
        let mut r = record_with(&[("dev", "https://d")]);
        assert!(r.switch_environment("prod").is_err());
        assert_eq!(r.current_environment.as_deref(), Some("dev"));
    }

    #[test]
    fn repair_fixes_dangling_pointer() {
        let mut r = record_with(&[("prod", "https://p")]);
        r.current_environment = Some("gone".to_string());
        assert!(r.repair_current_environment());
        assert_eq!(r.current_environment.as_deref(), Some("prod"));
        assert!(!r.repair_current_environment());
    }

    /// Any sequence of mutations leaves the invariant intact.
    #[test]
    fn invariant_holds_across_mutation_sequence() {
        let mut r = ConfigRecord::new("seq");
        let names = ["a", "b", "c", "d"];
        for i in 0..40 {
            let env = names[i % names.len()];
            match i % 5 {
                0 | 1 => {
                    let _ = r.set_endpoint(env, "https://h");
                }
                2 => {
                    let _ = r.remove_endpoint(env);
                }
                3 => {
                    let _ = r.rename_endpoint(env, names[(i + 1) % names.len()]);
                }
                _ => {
                    let _ = r.switch_environment(env);
                }
            }
            if let Some(cur) = &r.current_environment {
                assert!(r.endpoints.contains_key(cur), "dangling at step {i}: {r:?}");
            }
        }
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let mut r = ConfigRecord::new("x");
        r.api_key = Some("sk_live_secret".to_string());
        let rendered = format!("{r:?}");
        assert!(!rendered.contains("sk_live_secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn unknown_status_string_decodes_as_unknown() {
        let entry: LogEntry = serde_json::from_str(
            r#"{"timestamp":"2025-01-01T10:00:00Z","environment":"dev","status":"exploded","webhook_id":"w1"}"#,
        )
        .unwrap();
        assert_eq!(entry.status, DeliveryStatus::Unknown);
        assert_eq!(entry.response_code, None);
    }

    #[test]
    fn log_query_params_omit_unset_filters() {
        let q = LogQuery {
            limit: 5,
            status: Some(DeliveryStatus::DeadLetter),
            ..Default::default()
        };
        assert_eq!(
            q.to_params(),
            vec![
                ("limit", "5".to_string()),
                ("status", "dead_letter".to_string())
            ]
        );
    }
}
