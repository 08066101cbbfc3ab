// relayctl - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "relayctl";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "relayctl";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable that overrides the per-user state directory.
pub const HOME_ENV_VAR: &str = "RELAYCTL_HOME";

// =============================================================================
// Relay service API
// =============================================================================

/// Base URL used when neither the profile nor config.toml names one.
pub const DEFAULT_API_URL: &str = "https://api.daraja-toolkit.com";

/// Per-request budget covering connect, send and body read.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Minimum user-configurable request timeout (seconds).
pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;

/// Maximum user-configurable request timeout (seconds).
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// User-Agent header sent with every request.
pub const USER_AGENT: &str = concat!("relayctl/", env!("CARGO_PKG_VERSION"));

/// Budget for one reachability check of a webhook endpoint (seconds).
pub const ENDPOINT_CHECK_TIMEOUT_SECS: u64 = 10;

/// Endpoint status codes below this count as reachable.
pub const ENDPOINT_UNREACHABLE_STATUS: u16 = 500;

/// Default number of entries requested by a one-shot log listing.
pub const DEFAULT_LOG_LIMIT: u32 = 20;

/// Upper bound on a one-shot log listing.
pub const MAX_LOG_LIMIT: u32 = 1_000;

/// Default trailing window for metrics (days).
pub const DEFAULT_METRICS_DAYS: u32 = 7;

/// Upper bound on the metrics window (days).
pub const MAX_METRICS_DAYS: u32 = 365;

// =============================================================================
// Live tail
// =============================================================================

/// Number of most recent log entries fetched on each tail poll.
///
/// Bursts larger than this between two polls cannot be fully observed;
/// the tailer reports a `WindowSaturated` event when it detects one.
pub const DEFAULT_TAIL_WINDOW: u32 = 10;

/// Minimum user-configurable tail window.
pub const MIN_TAIL_WINDOW: u32 = 1;

/// Maximum user-configurable tail window.
pub const MAX_TAIL_WINDOW: u32 = 500;

/// Delay between successful tail polls (ms).
pub const TAIL_POLL_INTERVAL_MS: u64 = 2_000;

/// Delay after a failed tail poll before retrying (ms).
pub const TAIL_ERROR_BACKOFF_MS: u64 = 5_000;

/// Minimum user-configurable tail poll interval (ms).
pub const MIN_TAIL_POLL_INTERVAL_MS: u64 = 250;

/// Maximum user-configurable tail poll interval (ms).
pub const MAX_TAIL_POLL_INTERVAL_MS: u64 = 60_000;

/// Maximum user-configurable error backoff (ms).
pub const MAX_TAIL_ERROR_BACKOFF_MS: u64 = 300_000;

// =============================================================================
// Profiles
// =============================================================================

/// Profile name used by `login` when none is given.
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// Maximum profile name length. Names become file names.
pub const MAX_PROFILE_NAME_LEN: usize = 64;

/// Maximum size of a single profile file in bytes.
pub const MAX_PROFILE_FILE_SIZE: u64 = 64 * 1024; // 64 KB

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Persisted layout
// =============================================================================

/// Tool settings file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Subdirectory holding one TOML document per profile.
pub const PROFILES_DIR_NAME: &str = "profiles";

/// File extension of profile documents.
pub const PROFILE_FILE_EXTENSION: &str = "toml";

/// Index file recording the active profile name.
pub const ACTIVE_PROFILE_FILE_NAME: &str = "active_profile";
