// relayctl - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every failure surfaced by the profile store or the API client keeps its
// specific kind; the binary maps kinds to exit codes and nothing else.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all relayctl operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum RelayError {
    /// Profile store or local configuration failure.
    Config(ConfigError),

    /// Relay service request failure.
    Api(ApiError),

    /// Caller-side input validation failure.
    Validation(ValidationError),

    /// I/O error outside the profile store (e.g. reading a payload file).
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl RelayError {
    /// Process exit code for this error. Success is always 0.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Api(_) => 3,
            Self::Validation(_) => 4,
            Self::Io { .. } => 1,
        }
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Api(e) => write!(f, "API error: {e}"),
            Self::Validation(e) => write!(f, "Invalid input: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Api(e) => Some(e),
            Self::Validation(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// What a `NotFound` / `AlreadyExists` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Profile,
    Environment,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => f.write_str("profile"),
            Self::Environment => f.write_str("environment"),
        }
    }
}

/// Errors raised by the profile store and by record mutations.
#[derive(Debug)]
pub enum ConfigError {
    /// The named profile or environment does not exist.
    NotFound { subject: Subject, name: String },

    /// The target name of a create/rename is already taken.
    AlreadyExists { subject: Subject, name: String },

    /// Refused to delete the only remaining profile.
    LastProfile { name: String },

    /// A persisted document could not be parsed.
    InvalidFormat {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A value was rejected before being stored.
    InvalidValue {
        field: &'static str,
        value: String,
        expected: String,
    },

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl ConfigError {
    pub(crate) fn profile_not_found(name: &str) -> Self {
        Self::NotFound {
            subject: Subject::Profile,
            name: name.to_string(),
        }
    }

    pub(crate) fn environment_not_found(name: &str) -> Self {
        Self::NotFound {
            subject: Subject::Environment,
            name: name.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, operation: &'static str, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation,
            source,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { subject, name } => write!(f, "{subject} '{name}' not found"),
            Self::AlreadyExists { subject, name } => {
                write!(f, "{subject} '{name}' already exists")
            }
            Self::LastProfile { name } => write!(
                f,
                "cannot delete '{name}': it is the only remaining profile"
            ),
            Self::InvalidFormat { path, source } => {
                write!(f, "cannot parse '{}': {source}", path.display())
            }
            Self::InvalidValue {
                field,
                value,
                expected,
            } => write!(f, "'{field}' = '{value}' is invalid. Expected: {expected}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidFormat { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for RelayError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// API errors
// ---------------------------------------------------------------------------

/// Errors raised by the relay service client.
///
/// `Clone` so the tailer can hand the same error to its consumer and to
/// its own log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The profile has no API key; no request was attempted.
    MissingCredential,

    /// The service could not be reached.
    ConnectionFailed(String),

    /// The request exceeded its time budget.
    TimedOut,

    /// HTTP 401.
    AuthenticationFailed,

    /// HTTP 403.
    Forbidden,

    /// HTTP 404.
    NotFound,

    /// HTTP 5xx.
    ServerError { status: u16 },

    /// Any other non-success status, with the service's message if it sent one.
    ClientError { status: u16, message: String },

    /// A success response whose body could not be decoded.
    InvalidResponse(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => {
                f.write_str("API key not configured. Run 'relayctl login' first.")
            }
            Self::ConnectionFailed(detail) => write!(f, "connection failed: {detail}"),
            Self::TimedOut => f.write_str("request timed out"),
            Self::AuthenticationFailed => {
                f.write_str("authentication failed; check your API key")
            }
            Self::Forbidden => f.write_str("access forbidden; check your permissions"),
            Self::NotFound => f.write_str("resource not found"),
            Self::ServerError { status } => {
                write!(f, "server error (HTTP {status}); try again later")
            }
            Self::ClientError { message, .. } => f.write_str(message),
            Self::InvalidResponse(detail) => write!(f, "unexpected response body: {detail}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ApiError> for RelayError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// Caller-side input checks performed before the core is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Status filter is not one of the known delivery states.
    UnknownStatus { value: String },

    /// A date bound is neither RFC 3339 nor `YYYY-MM-DD`.
    InvalidDate { field: &'static str, value: String },

    /// Start bound is after end bound.
    InvertedRange { start: String, end: String },

    /// Endpoint URL is not an absolute http(s) URL.
    InvalidUrl { value: String },

    /// Profile name cannot be used as a file name.
    InvalidProfileName { value: String, reason: &'static str },

    /// Environment name is empty or blank.
    InvalidEnvironmentName { value: String },

    /// A test payload file is not valid JSON.
    InvalidPayload { path: PathBuf, detail: String },

    /// A numeric argument is outside its allowed range.
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownStatus { value } => write!(
                f,
                "unknown status '{value}'. Valid values: delivered, failed, pending, retrying, dead_letter"
            ),
            Self::InvalidDate { field, value } => write!(
                f,
                "{field} '{value}' is not a date (expected YYYY-MM-DD or RFC 3339)"
            ),
            Self::InvertedRange { start, end } => {
                write!(f, "start date '{start}' is after end date '{end}'")
            }
            Self::InvalidUrl { value } => {
                write!(f, "'{value}' must be an absolute http:// or https:// URL")
            }
            Self::InvalidProfileName { value, reason } => {
                write!(f, "profile name '{value}' {reason}")
            }
            Self::InvalidEnvironmentName { value } => {
                write!(f, "environment name '{value}' must not be empty or blank")
            }
            Self::InvalidPayload { path, detail } => {
                write!(f, "payload '{}' is not valid JSON: {detail}", path.display())
            }
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field} = {value} is out of range ({min}-{max})"),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for RelayError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

/// Convenience type alias for relayctl results.
pub type Result<T> = std::result::Result<T, RelayError>;
