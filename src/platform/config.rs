// relayctl - platform/config.rs
//
// Per-user state directory resolution and config.toml loading with startup
// validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance. RELAYCTL_HOME or --home overrides it.

use crate::util::constants;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved locations of everything relayctl persists.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Root state directory (e.g. ~/.config/relayctl/).
    pub root_dir: PathBuf,

    /// One TOML document per profile (root_dir/profiles/).
    pub profiles_dir: PathBuf,

    /// Active-profile index file (root_dir/active_profile).
    pub active_profile_file: PathBuf,

    /// Tool settings (root_dir/config.toml).
    pub config_file: PathBuf,
}

impl PlatformPaths {
    /// Lay out all paths under an explicit root.
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root_dir = root.into();
        Self {
            profiles_dir: root_dir.join(constants::PROFILES_DIR_NAME),
            active_profile_file: root_dir.join(constants::ACTIVE_PROFILE_FILE_NAME),
            config_file: root_dir.join(constants::CONFIG_FILE_NAME),
            root_dir,
        }
    }

    /// Resolve platform-appropriate paths.
    ///
    /// `override_root` (from --home or RELAYCTL_HOME) wins. Falls back to
    /// `./.relayctl` if platform dirs cannot be determined, returning a
    /// warning for the caller to log once logging is up.
    pub fn resolve(override_root: Option<&Path>) -> (Self, Option<String>) {
        if let Some(root) = override_root {
            return (Self::under(root), None);
        }

        match ProjectDirs::from("", "", constants::APP_ID) {
            Some(proj_dirs) => (Self::under(proj_dirs.config_dir()), None),
            None => {
                let fallback = PathBuf::from(".").join(format!(".{}", constants::APP_ID));
                let warning = format!(
                    "could not determine platform directories, using {}",
                    fallback.display()
                );
                (Self::under(fallback), Some(warning))
            }
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[api]` section.
    pub api: ApiSection,
    /// `[tail]` section.
    pub tail: TailSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[api]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ApiSection {
    /// Service base URL used by `login` when none is given.
    pub url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// `[tail]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct TailSection {
    /// Entries fetched per poll.
    pub window: Option<u32>,
    /// Delay between polls in ms.
    pub poll_interval_ms: Option<u64>,
    /// Delay after a failed poll in ms.
    pub error_backoff_ms: Option<u64>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated tool configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Service base URL for new logins.
    pub api_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,

    /// Entries fetched per tail poll.
    pub tail_window: u32,
    /// Delay between successful tail polls.
    pub tail_poll_interval: Duration,
    /// Delay after a failed tail poll.
    pub tail_error_backoff: Duration,

    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(constants::DEFAULT_REQUEST_TIMEOUT_SECS),
            tail_window: constants::DEFAULT_TAIL_WINDOW,
            tail_poll_interval: Duration::from_millis(constants::TAIL_POLL_INTERVAL_MS),
            tail_error_backoff: Duration::from_millis(constants::TAIL_ERROR_BACKOFF_MS),
            log_level: None,
        }
    }
}

/// Load and validate `config.toml` at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// A missing file means defaults with no warnings. An unparseable file means
/// defaults plus a warning; the tool still runs.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(e) => {
            warnings.push(format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            ));
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            warnings.push(format!(
                "Failed to parse config file '{}': {e}. Using defaults.",
                config_path.display()
            ));
            return (AppConfig::default(), warnings);
        }
    };

    let mut config = AppConfig::default();

    // -- API: url --
    if let Some(ref url) = raw.api.url {
        if crate::core::filter::is_http_url(url) {
            config.api_url = url.trim_end_matches('/').to_string();
        } else {
            warnings.push(format!(
                "[api] url = \"{url}\" is not an http(s) URL. Using default ({}).",
                constants::DEFAULT_API_URL,
            ));
        }
    }

    // -- API: timeout_secs --
    if let Some(secs) = raw.api.timeout_secs {
        if (constants::MIN_REQUEST_TIMEOUT_SECS..=constants::MAX_REQUEST_TIMEOUT_SECS)
            .contains(&secs)
        {
            config.request_timeout = Duration::from_secs(secs);
        } else {
            warnings.push(format!(
                "[api] timeout_secs = {secs} is out of range ({}-{}). Using default ({}).",
                constants::MIN_REQUEST_TIMEOUT_SECS,
                constants::MAX_REQUEST_TIMEOUT_SECS,
                constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            ));
        }
    }

    // -- Tail: window --
    if let Some(window) = raw.tail.window {
        if (constants::MIN_TAIL_WINDOW..=constants::MAX_TAIL_WINDOW).contains(&window) {
            config.tail_window = window;
        } else {
            warnings.push(format!(
                "[tail] window = {window} is out of range ({}-{}). Using default ({}).",
                constants::MIN_TAIL_WINDOW,
                constants::MAX_TAIL_WINDOW,
                constants::DEFAULT_TAIL_WINDOW,
            ));
        }
    }

    // -- Tail: poll_interval_ms --
    if let Some(ms) = raw.tail.poll_interval_ms {
        if (constants::MIN_TAIL_POLL_INTERVAL_MS..=constants::MAX_TAIL_POLL_INTERVAL_MS)
            .contains(&ms)
        {
            config.tail_poll_interval = Duration::from_millis(ms);
        } else {
            warnings.push(format!(
                "[tail] poll_interval_ms = {ms} is out of range ({}-{}). Using default ({}).",
                constants::MIN_TAIL_POLL_INTERVAL_MS,
                constants::MAX_TAIL_POLL_INTERVAL_MS,
                constants::TAIL_POLL_INTERVAL_MS,
            ));
        }
    }

    // -- Tail: error_backoff_ms --
    if let Some(ms) = raw.tail.error_backoff_ms {
        if (constants::MIN_TAIL_POLL_INTERVAL_MS..=constants::MAX_TAIL_ERROR_BACKOFF_MS)
            .contains(&ms)
        {
            config.tail_error_backoff = Duration::from_millis(ms);
        } else {
            warnings.push(format!(
                "[tail] error_backoff_ms = {ms} is out of range ({}-{}). Using default ({}).",
                constants::MIN_TAIL_POLL_INTERVAL_MS,
                constants::MAX_TAIL_ERROR_BACKOFF_MS,
                constants::TAIL_ERROR_BACKOFF_MS,
            ));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults_without_warnings() {
        let dir = TempDir::new().unwrap();
        let (config, warnings) = load_config(&dir.path().join("config.toml"));
        assert_eq!(config, AppConfig::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn valid_values_are_applied() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[api]
url = "http://localhost:4000/"
timeout_secs = 5

[tail]
window = 50
poll_interval_ms = 1000
error_backoff_ms = 10000

[logging]
level = "DEBUG"
"#,
        )
        .unwrap();

        let (config, warnings) = load_config(&path);
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(config.api_url, "http://localhost:4000");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.tail_window, 50);
        assert_eq!(config.tail_poll_interval, Duration::from_millis(1000));
        assert_eq!(config.tail_error_backoff, Duration::from_millis(10_000));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn out_of_range_values_warn_and_fall_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tail]\nwindow = 0\n[api]\ntimeout_secs = 9999\n").unwrap();

        let (config, warnings) = load_config(&path);
        assert_eq!(warnings.len(), 2);
        assert_eq!(config.tail_window, constants::DEFAULT_TAIL_WINDOW);
        assert_eq!(
            config.request_timeout,
            Duration::from_secs(constants::DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn unparseable_file_warns_and_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tail\nwindow = ").unwrap();

        let (config, warnings) = load_config(&path);
        assert_eq!(warnings.len(), 1);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn override_root_lays_out_all_paths() {
        let (paths, warning) = PlatformPaths::resolve(Some(Path::new("/tmp/relay-home")));
        assert!(warning.is_none());
        assert_eq!(paths.profiles_dir, Path::new("/tmp/relay-home/profiles"));
        assert_eq!(
            paths.active_profile_file,
            Path::new("/tmp/relay-home/active_profile")
        );
        assert_eq!(paths.config_file, Path::new("/tmp/relay-home/config.toml"));
    }

    #[test]
    fn fallback_directory_comes_with_a_warning() {
        let (paths, warning) = PlatformPaths::resolve(None);
        match warning {
            Some(text) => {
                assert_eq!(paths.root_dir, Path::new("./.relayctl"));
                assert!(text.contains(".relayctl"));
            }
            None => assert!(paths.root_dir.ends_with(constants::APP_ID)),
        }
    }
}
