// relayctl - core/check.rs
//
// Offline consistency check of a profile record: required identity fields,
// endpoint URL shape, and the current-environment pointer. No I/O.

use crate::core::filter;
use crate::core::model::ConfigRecord;
use serde::Serialize;

/// Findings for one record. Issues break some command; warnings do not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordCheck {
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

impl RecordCheck {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check `record` without contacting the service.
pub fn check_record(record: &ConfigRecord) -> RecordCheck {
    let mut check = RecordCheck::default();

    let permanent_url_missing = record
        .permanent_url
        .as_deref()
        .map_or(true, |url| url.trim().is_empty());
    let required = [
        ("user_id", record.user_id.trim().is_empty()),
        ("api_key", !record.has_credentials()),
        ("permanent_url", permanent_url_missing),
    ];
    for (field, missing) in required {
        if missing {
            check.issues.push(format!("Missing required field: {field}"));
        }
    }

    for (environment, url) in &record.endpoints {
        if !filter::is_http_url(url) {
            check
                .issues
                .push(format!("Invalid URL format for {environment}: {url}"));
        }
    }

    if let Some(current) = record.current_environment.as_deref() {
        if !record.endpoints.contains_key(current) {
            check.issues.push(format!(
                "Current environment '{current}' has no configured endpoint"
            ));
        }
    }

    if record.endpoints.is_empty() {
        check.warnings.push("No endpoints configured".to_string());
    }

    check
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ConfigRecord {
        let mut r = ConfigRecord::new("work");
        r.user_id = "u_42".to_string();
        r.api_key = Some("sk_test".to_string());
        r.permanent_url = Some("https://relay.example.com/hooks/u_42".to_string());
        r.set_endpoint("dev", "http://localhost:3000/hook").unwrap();
        r
    }

    #[test]
    fn complete_record_is_valid() {
        let check = check_record(&complete());
        assert!(check.is_valid());
        assert!(check.warnings.is_empty());
    }

    #[test]
    fn fresh_record_lists_every_missing_field() {
        let check = check_record(&ConfigRecord::new("work"));
        assert_eq!(
            check.issues,
            vec![
                "Missing required field: user_id",
                "Missing required field: api_key",
                "Missing required field: permanent_url",
            ]
        );
        assert_eq!(check.warnings, vec!["No endpoints configured"]);
        assert!(!check.is_valid());
    }

    #[test]
    fn hand_edited_endpoint_and_pointer_are_reported() {
        let mut r = complete();
        r.endpoints
            .insert("prod".to_string(), "prod.example.com/hook".to_string());
        r.current_environment = Some("staging".to_string());

        let check = check_record(&r);
        assert_eq!(
            check.issues,
            vec![
                "Invalid URL format for prod: prod.example.com/hook",
                "Current environment 'staging' has no configured endpoint",
            ]
        );
        assert!(check.warnings.is_empty());
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let mut r = complete();
        r.api_key = Some(String::new());
        assert_eq!(
            check_record(&r).issues,
            vec!["Missing required field: api_key"]
        );
    }
}
