// relayctl - core/filter.rs
//
// Caller-side validation of user-supplied filter values. The API client
// transmits whatever it is given; everything semantic is checked here
// before a `LogQuery` is built.

use crate::core::model::{DeliveryStatus, LogQuery};
use crate::util::constants;
use crate::util::error::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};

/// Parse a status filter. Case-insensitive; `unknown` is not a filter.
pub fn parse_status(value: &str) -> Result<DeliveryStatus, ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "delivered" => Ok(DeliveryStatus::Delivered),
        "failed" => Ok(DeliveryStatus::Failed),
        "pending" => Ok(DeliveryStatus::Pending),
        "retrying" => Ok(DeliveryStatus::Retrying),
        "dead_letter" | "dead-letter" => Ok(DeliveryStatus::DeadLetter),
        _ => Err(ValidationError::UnknownStatus {
            value: value.to_string(),
        }),
    }
}

/// Parse a date bound: an RFC 3339 instant, or a bare `YYYY-MM-DD` taken as
/// midnight UTC.
pub fn parse_date_bound(field: &'static str, value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        })
}

/// Both bounds must parse and `start <= end` when both are present.
pub fn validate_date_range(start: Option<&str>, end: Option<&str>) -> Result<(), ValidationError> {
    let start_dt = start.map(|s| parse_date_bound("start_date", s)).transpose()?;
    let end_dt = end.map(|e| parse_date_bound("end_date", e)).transpose()?;

    if let (Some(s), Some(e)) = (start_dt, end_dt) {
        if s > e {
            return Err(ValidationError::InvertedRange {
                start: start.unwrap_or_default().to_string(),
                end: end.unwrap_or_default().to_string(),
            });
        }
    }
    Ok(())
}

/// True for `http://host...` and `https://host...`.
pub fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty() && !host.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Reject anything but an absolute http(s) URL.
pub fn validate_endpoint_url(value: &str) -> Result<(), ValidationError> {
    if is_http_url(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl {
            value: value.to_string(),
        })
    }
}

/// Profile names become file names, so keep them to a portable alphabet.
pub fn validate_profile_name(value: &str) -> Result<(), ValidationError> {
    let reject = |reason| {
        Err(ValidationError::InvalidProfileName {
            value: value.to_string(),
            reason,
        })
    };

    if value.is_empty() {
        return reject("must not be empty");
    }
    if value.len() > constants::MAX_PROFILE_NAME_LEN {
        return reject("is longer than 64 characters");
    }
    if value.starts_with('.') {
        return reject("must not start with '.'");
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return reject("may only contain letters, digits, '_', '-' and '.'");
    }
    Ok(())
}

/// Environment names key the endpoint map and are sent to the service.
pub fn validate_environment_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidEnvironmentName {
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Check a numeric argument against an inclusive range.
pub fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Raw, unvalidated log filter values as typed by a user.
#[derive(Debug, Clone, Default)]
pub struct LogFilterInput {
    pub limit: Option<u32>,
    pub environment: Option<String>,
    pub status: Option<String>,
    pub webhook_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Validate every filter and produce the query the client will transmit.
///
/// Date bounds are forwarded exactly as typed once they are known to parse.
pub fn build_log_query(input: LogFilterInput) -> Result<LogQuery, ValidationError> {
    let limit = input.limit.unwrap_or(constants::DEFAULT_LOG_LIMIT);
    check_range("limit", u64::from(limit), 1, u64::from(constants::MAX_LOG_LIMIT))?;

    let status = input.status.as_deref().map(parse_status).transpose()?;
    validate_date_range(input.start_date.as_deref(), input.end_date.as_deref())?;

    Ok(LogQuery {
        limit,
        environment: input.environment.filter(|e| !e.is_empty()),
        status,
        webhook_id: input.webhook_id.filter(|w| !w.is_empty()),
        start_date: input.start_date,
        end_date: input.end_date,
    })
}
