// relayctl - cli.rs
//
// Command-line surface: clap definitions, command handlers and the output
// sink. Everything the user sees on stdout is written here; the library
// layers only return values and log to stderr.
//
// Output modes:
//   default   human-readable lines
//   --json    one JSON document per line (JSON lines), for scripting

use clap::{Args, Parser, Subcommand};
use relayctl::app::api_client::{ApiClient, ClientSettings};
use relayctl::app::endpoint_check::{self, EndpointReport};
use relayctl::app::profile_store::ProfileStore;
use relayctl::app::session::{self, LoginRequest};
use relayctl::app::tail::{LogTailer, TailConfig, TailEvent};
use relayctl::core::check::{self, RecordCheck};
use relayctl::core::filter::{self, LogFilterInput};
use relayctl::core::model::{ConfigRecord, LogEntry, Metrics, WebhookStatus};
use relayctl::platform::config::AppConfig;
use relayctl::util::constants;
use relayctl::util::error::{ConfigError, RelayError, Result, Subject, ValidationError};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Arguments
// =============================================================================

/// relayctl - manage webhook relay profiles, environments and delivery logs.
#[derive(Parser, Debug)]
#[command(name = "relayctl", version, about)]
pub struct Cli {
    /// State directory (profiles, active profile, config.toml).
    #[arg(long, env = constants::HOME_ENV_VAR, global = true)]
    pub home: Option<PathBuf>,

    /// Profile to use instead of the active one.
    #[arg(short = 'p', long, global = true)]
    pub profile: Option<String>,

    /// Print results as JSON lines.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate an API key and save it as a profile.
    Login {
        /// Email address to record.
        #[arg(long)]
        email: Option<String>,

        /// API key from the dashboard.
        #[arg(long, env = "RELAYCTL_API_KEY", hide_env_values = true)]
        api_key: String,

        /// Relay service base URL.
        #[arg(long)]
        api_url: Option<String>,
    },

    /// Remove every saved profile.
    Logout,

    /// Show the identity of the selected profile.
    Whoami,

    /// Manage saved profiles.
    #[command(subcommand)]
    Profiles(ProfilesCommand),

    /// Manage environments and their endpoint URLs.
    #[command(subcommand)]
    Env(EnvCommand),

    /// Delivery status, logs and metrics.
    #[command(subcommand)]
    Monitor(MonitorCommand),

    /// Test webhooks, endpoints and the saved profile.
    #[command(subcommand)]
    Test(TestCommand),
}

#[derive(Subcommand, Debug)]
pub enum ProfilesCommand {
    /// List saved profiles.
    List,
    /// Make a profile active.
    Use { name: String },
    /// Delete a profile.
    Delete { name: String },
    /// Rename a profile.
    Rename { old: String, new: String },
    /// Show a profile's settings (the API key is never shown).
    Show { name: Option<String> },
}

#[derive(Subcommand, Debug)]
pub enum EnvCommand {
    /// List configured environments.
    List,
    /// Show the current environment and its endpoint.
    Status,
    /// Add or replace an environment's endpoint URL.
    Add { environment: String, url: String },
    /// Remove an environment.
    Remove { environment: String },
    /// Rename an environment.
    Rename { old: String, new: String },
    /// Make an environment current.
    Switch { environment: String },
    /// Register an endpoint URL with the service and save it locally.
    Update { environment: String, url: String },
    /// List environments known to the service.
    Remote,
}

#[derive(Subcommand, Debug)]
pub enum TestCommand {
    /// Send a test webhook through the service.
    Webhook {
        /// Target environment (defaults to the current one).
        #[arg(short = 'e', long)]
        environment: Option<String>,

        /// JSON file to send as the payload.
        #[arg(long)]
        payload: Option<PathBuf>,
    },
    /// Check that an endpoint answers (defaults to the current environment's).
    Endpoint { url: Option<String> },
    /// Check the selected profile for missing or inconsistent settings.
    Validate,
}

#[derive(Subcommand, Debug)]
pub enum MonitorCommand {
    /// Delivery statistics.
    Status,
    /// Recent delivery logs, or follow them with --tail.
    Logs(LogsArgs),
    /// Delivery metrics over the last N days.
    Metrics {
        #[arg(short = 'n', long, default_value_t = constants::DEFAULT_METRICS_DAYS)]
        days: u32,
    },
    /// Replay a delivery.
    Replay { webhook_id: String },
    /// Show one delivery in full.
    Detail { webhook_id: String },
}

#[derive(Args, Debug, Default)]
pub struct LogsArgs {
    /// Follow new deliveries until Ctrl-C.
    #[arg(short = 'f', long)]
    pub tail: bool,

    /// Number of entries to show.
    #[arg(short = 'n', long, conflicts_with = "tail")]
    pub limit: Option<u32>,

    /// Only this environment.
    #[arg(short = 'e', long)]
    pub environment: Option<String>,

    /// Only this status (delivered, failed, pending, retrying, dead_letter).
    #[arg(long, conflicts_with = "tail")]
    pub status: Option<String>,

    /// Only this webhook.
    #[arg(long, conflicts_with = "tail")]
    pub webhook_id: Option<String>,

    /// Earliest delivery (YYYY-MM-DD or RFC 3339).
    #[arg(long, conflicts_with = "tail")]
    pub since: Option<String>,

    /// Latest delivery (YYYY-MM-DD or RFC 3339).
    #[arg(long, conflicts_with = "tail")]
    pub until: Option<String>,
}

// =============================================================================
// Output sink
// =============================================================================

/// Writes command results to stdout.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    json: bool,
}

impl Printer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `value` as JSON, or the `human` rendering of it.
    pub fn emit<T: Serialize + ?Sized>(&self, value: &T, human: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            let line = serde_json::to_string(value).map_err(|e| stdout_error(e.into()))?;
            write_line(&line)
        } else {
            write_line(&human())
        }
    }

    /// Print a short confirmation.
    pub fn message(&self, text: &str) -> Result<()> {
        self.emit(&serde_json::json!({ "message": text }), || text.to_string())
    }

    fn tail_event(&self, event: &TailEvent) -> Result<()> {
        match event {
            TailEvent::Entry(entry) => self.emit(entry, || format_entry(entry)),
            TailEvent::Started { watermark } if self.json => {
                self.emit(&serde_json::json!({ "event": "started", "watermark": watermark }), String::new)
            }
            TailEvent::Started { .. } => {
                eprintln!("Following delivery logs (Ctrl-C to stop)...");
                Ok(())
            }
            TailEvent::WindowSaturated { window } if self.json => {
                self.emit(&serde_json::json!({ "event": "window_saturated", "window": window }), String::new)
            }
            TailEvent::WindowSaturated { window } => {
                eprintln!("warning: more than {window} deliveries since the last poll; some may not be shown");
                Ok(())
            }
            TailEvent::PollFailed { error, retry_in } if self.json => self.emit(
                &serde_json::json!({
                    "event": "poll_failed",
                    "error": error.to_string(),
                    "retry_in_ms": retry_in.as_millis() as u64,
                }),
                String::new,
            ),
            TailEvent::PollFailed { error, retry_in } => {
                eprintln!("error: {error} (retrying in {}s)", retry_in.as_secs());
                Ok(())
            }
            TailEvent::Stopped { emitted } if self.json => {
                self.emit(&serde_json::json!({ "event": "stopped", "emitted": emitted }), String::new)
            }
            TailEvent::Stopped { emitted } => {
                eprintln!("Stopped after {emitted} new deliveries.");
                Ok(())
            }
        }
    }
}

fn write_line(text: &str) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{text}").map_err(stdout_error)
}

fn stdout_error(source: io::Error) -> RelayError {
    RelayError::Io {
        path: PathBuf::from("<stdout>"),
        operation: "write output",
        source,
    }
}

/// One log entry as a single human-readable line.
pub fn format_entry(entry: &LogEntry) -> String {
    let code = entry
        .response_code
        .map_or_else(|| "-".to_string(), |c| c.to_string());
    let duration = entry
        .duration_ms
        .map_or_else(|| "-".to_string(), |d| format!("{d}ms"));
    format!(
        "{} {:<10} {:<11} {:>4} {:>7} {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.environment,
        entry.status.as_str(),
        code,
        duration,
        entry.webhook_id
    )
}

// =============================================================================
// Dispatch
// =============================================================================

/// Everything a command handler needs.
pub struct Context {
    pub store: ProfileStore,
    pub config: AppConfig,
    pub settings: ClientSettings,
    /// `--profile`, if given.
    pub profile: Option<String>,
    pub out: Printer,
    pub cancel: CancellationToken,
}

impl Context {
    /// The selected profile: `--profile` if given, else the active one.
    fn record(&self) -> Result<ConfigRecord> {
        let record = match &self.profile {
            Some(name) => self.store.load(name)?,
            None => self.store.load_active()?,
        };
        Ok(record)
    }

    fn client(&self) -> Result<(ConfigRecord, ApiClient)> {
        let record = self.record()?;
        let client = ApiClient::new(&record, &self.settings)?;
        Ok((record, client))
    }

    fn save(&self, record: &ConfigRecord) -> Result<()> {
        self.store.save(&record.name, record)?;
        Ok(())
    }
}

/// Run one command to completion.
pub async fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Login {
            email,
            api_key,
            api_url,
        } => login(ctx, email, api_key, api_url).await,
        Command::Logout => {
            session::logout(&ctx.store)?;
            ctx.out.message("Logged out; all profiles removed.")
        }
        Command::Whoami => {
            let identity = session::whoami(&ctx.record()?);
            ctx.out.emit(&identity, || {
                format!(
                    "Profile:             {}\nName:                {}\nEmail:               {}\nUser ID:             {}\nCurrent environment: {}\nPermanent URL:       {}",
                    identity.profile,
                    identity.user_name,
                    identity.email,
                    identity.user_id,
                    identity.current_environment.as_deref().unwrap_or("(none)"),
                    identity.permanent_url.as_deref().unwrap_or("(not available)"),
                )
            })
        }
        Command::Profiles(cmd) => profiles(ctx, cmd),
        Command::Env(cmd) => env(ctx, cmd).await,
        Command::Monitor(cmd) => monitor(ctx, cmd).await,
        Command::Test(cmd) => test(ctx, cmd).await,
    }
}

async fn login(
    ctx: &Context,
    email: Option<String>,
    api_key: String,
    api_url: Option<String>,
) -> Result<()> {
    let request = LoginRequest {
        profile: ctx
            .profile
            .clone()
            .unwrap_or_else(|| constants::DEFAULT_PROFILE_NAME.to_string()),
        email: email.unwrap_or_default(),
        api_key,
        api_url: api_url.unwrap_or_else(|| ctx.config.api_url.clone()),
    };
    let record = session::login(&ctx.store, request, &ctx.settings).await?;
    let identity = session::whoami(&record);
    ctx.out.emit(&identity, || {
        format!(
            "Logged in as {} ({}) on profile '{}'.\nPermanent webhook URL: {}",
            identity.user_name,
            identity.user_id,
            identity.profile,
            identity.permanent_url.as_deref().unwrap_or("(not available)"),
        )
    })
}

// -----------------------------------------------------------------------------
// profiles
// -----------------------------------------------------------------------------

#[derive(Serialize)]
struct ProfileRow {
    name: String,
    active: bool,
}

fn profiles(ctx: &Context, cmd: ProfilesCommand) -> Result<()> {
    match cmd {
        ProfilesCommand::List => {
            let names = ctx.store.list()?;
            let active = if names.is_empty() {
                None
            } else {
                Some(ctx.store.get_active_name()?)
            };
            let rows: Vec<ProfileRow> = names
                .into_iter()
                .map(|name| ProfileRow {
                    active: active.as_deref() == Some(name.as_str()),
                    name,
                })
                .collect();
            ctx.out.emit(&rows, || {
                if rows.is_empty() {
                    return "No profiles saved. Run 'relayctl login' first.".to_string();
                }
                rows.iter()
                    .map(|r| format!("{} {}", if r.active { "*" } else { " " }, r.name))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        ProfilesCommand::Use { name } => {
            ctx.store.switch_active(&name)?;
            ctx.out.message(&format!("Switched to profile '{name}'."))
        }
        ProfilesCommand::Delete { name } => {
            ctx.store.delete(&name)?;
            let active = ctx.store.get_active_name()?;
            ctx.out
                .message(&format!("Deleted profile '{name}'. Active profile: '{active}'."))
        }
        ProfilesCommand::Rename { old, new } => {
            ctx.store.rename(&old, &new)?;
            ctx.out.message(&format!("Renamed profile '{old}' to '{new}'."))
        }
        ProfilesCommand::Show { name } => {
            let record = match name {
                Some(name) => ctx.store.load(&name)?,
                None => ctx.record()?,
            };
            // Serialise without the key.
            let shown = ConfigRecord {
                api_key: record.api_key.as_ref().map(|_| "<redacted>".to_string()),
                ..record
            };
            ctx.out.emit(&shown, || {
                let mut lines = vec![
                    format!("Profile:     {}", shown.name),
                    format!("User:        {} <{}>", shown.user_name, shown.email),
                    format!("API URL:     {}", shown.api_url),
                    format!(
                        "API key:     {}",
                        if shown.has_credentials() { "configured" } else { "missing" }
                    ),
                    "Endpoints:".to_string(),
                ];
                lines.extend(endpoint_lines(&shown));
                lines.join("\n")
            })
        }
    }
}

// -----------------------------------------------------------------------------
// env
// -----------------------------------------------------------------------------

#[derive(Serialize)]
struct EndpointRow<'a> {
    environment: &'a str,
    url: &'a str,
    current: bool,
}

fn endpoint_rows(record: &ConfigRecord) -> Vec<EndpointRow<'_>> {
    record
        .endpoints
        .iter()
        .map(|(env, url)| EndpointRow {
            environment: env,
            url,
            current: record.current_environment.as_deref() == Some(env.as_str()),
        })
        .collect()
}

fn endpoint_lines(record: &ConfigRecord) -> Vec<String> {
    if record.endpoints.is_empty() {
        return vec!["  (none; add one with 'relayctl env add <name> <url>')".to_string()];
    }
    endpoint_rows(record)
        .iter()
        .map(|r| {
            format!(
                "{} {:<12} {}",
                if r.current { "*" } else { " " },
                r.environment,
                r.url
            )
        })
        .collect()
}

async fn env(ctx: &Context, cmd: EnvCommand) -> Result<()> {
    match cmd {
        EnvCommand::List => {
            let record = ctx.record()?;
            let rows = endpoint_rows(&record);
            ctx.out.emit(&rows, || endpoint_lines(&record).join("\n"))
        }
        EnvCommand::Status => {
            let record = ctx.record()?;
            let current = record.current_environment.as_deref();
            let url = record.current_endpoint();
            ctx.out.emit(
                &serde_json::json!({ "environment": current, "url": url }),
                || match (current, url) {
                    (Some(env), Some(url)) => format!("Current environment: {env}\nEndpoint: {url}"),
                    _ => "No current environment set.".to_string(),
                },
            )
        }
        EnvCommand::Add { environment, url } => {
            filter::validate_environment_name(&environment)?;
            filter::validate_endpoint_url(&url)?;
            let mut record = ctx.record()?;
            record.set_endpoint(&environment, &url)?;
            ctx.save(&record)?;
            ctx.out.message(&format!(
                "Set '{environment}' endpoint to {url}. Current environment: {}.",
                record.current_environment.as_deref().unwrap_or("(none)")
            ))
        }
        EnvCommand::Remove { environment } => {
            let mut record = ctx.record()?;
            record.remove_endpoint(&environment)?;
            ctx.save(&record)?;
            ctx.out.message(&format!(
                "Removed '{environment}'. Current environment: {}.",
                record.current_environment.as_deref().unwrap_or("(none)")
            ))
        }
        EnvCommand::Rename { old, new } => {
            let mut record = ctx.record()?;
            record.rename_endpoint(&old, &new)?;
            ctx.save(&record)?;
            ctx.out.message(&format!("Renamed environment '{old}' to '{new}'."))
        }
        EnvCommand::Switch { environment } => {
            let mut record = ctx.record()?;
            record.switch_environment(&environment)?;
            ctx.save(&record)?;
            ctx.out.message(&format!(
                "Switched to '{environment}'. Webhooks go to {}.",
                record.current_endpoint().unwrap_or_default()
            ))
        }
        EnvCommand::Update { environment, url } => {
            filter::validate_environment_name(&environment)?;
            filter::validate_endpoint_url(&url)?;
            let (mut record, client) = ctx.client()?;
            client.update_endpoint(&environment, &url).await?;
            record.set_endpoint(&environment, &url)?;
            ctx.save(&record)?;
            ctx.out
                .message(&format!("Registered '{environment}' endpoint {url} with the service."))
        }
        EnvCommand::Remote => {
            let (_, client) = ctx.client()?;
            let envs = client.list_environments().await?;
            ctx.out.emit(&envs, || {
                if envs.is_empty() {
                    return "The service reports no environments.".to_string();
                }
                envs.iter()
                    .map(|e| {
                        format!(
                            "{:<12} {:<10} {}",
                            e.name,
                            e.status.as_deref().unwrap_or("-"),
                            e.url.as_deref().unwrap_or("-")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

// -----------------------------------------------------------------------------
// monitor / test
// -----------------------------------------------------------------------------

async fn monitor(ctx: &Context, cmd: MonitorCommand) -> Result<()> {
    match cmd {
        MonitorCommand::Status => {
            let (_, client) = ctx.client()?;
            let status = client.get_webhook_status().await?;
            ctx.out.emit(&status, || format_status(&status))
        }
        MonitorCommand::Logs(args) if args.tail => tail_logs(ctx, args).await,
        MonitorCommand::Logs(args) => {
            let query = filter::build_log_query(LogFilterInput {
                limit: args.limit,
                environment: args.environment,
                status: args.status,
                webhook_id: args.webhook_id,
                start_date: args.since,
                end_date: args.until,
            })?;
            let (_, client) = ctx.client()?;
            let mut logs = client.get_webhook_logs(&query).await?;
            logs.sort_by_key(|e| e.timestamp);

            if ctx.out.json {
                for entry in &logs {
                    ctx.out.emit(entry, String::new)?;
                }
                Ok(())
            } else if logs.is_empty() {
                ctx.out.message("No deliveries match.")
            } else {
                let lines: Vec<String> = logs.iter().map(format_entry).collect();
                write_line(&lines.join("\n"))
            }
        }
        MonitorCommand::Metrics { days } => {
            filter::check_range("days", u64::from(days), 1, u64::from(constants::MAX_METRICS_DAYS))?;
            let (_, client) = ctx.client()?;
            let metrics = client.get_metrics(days).await?;
            ctx.out.emit(&metrics, || format_metrics(days, &metrics))
        }
        MonitorCommand::Replay { webhook_id } => {
            let (_, client) = ctx.client()?;
            let result = client.replay_webhook(&webhook_id).await?;
            ctx.out
                .emit(&result, || format!("Replay of '{webhook_id}' requested.\n{}", pretty(&result)))
        }
        MonitorCommand::Detail { webhook_id } => {
            let (_, client) = ctx.client()?;
            let detail = client.get_webhook_detail(&webhook_id).await?;
            ctx.out.emit(&detail, || pretty(&detail))
        }
    }
}

async fn tail_logs(ctx: &Context, args: LogsArgs) -> Result<()> {
    let (_, client) = ctx.client()?;
    let config = TailConfig {
        environment: args.environment,
        ..TailConfig::from(&ctx.config)
    };
    let tailer = LogTailer::new(client, config, ctx.cancel.clone());

    // Ctrl-C ends the tail cleanly instead of killing the process.
    let interrupt = ctx.cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("Interrupt received");
            interrupt.cancel();
        }
    });

    let out = ctx.out;
    let cancel = ctx.cancel.clone();
    let mut write_error: Option<RelayError> = None;
    tailer
        .run(|event| {
            if write_error.is_some() {
                return;
            }
            if let Err(e) = out.tail_event(&event) {
                write_error = Some(e);
                cancel.cancel();
            }
        })
        .await;
    ctrl_c.abort();

    match write_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn test(ctx: &Context, cmd: TestCommand) -> Result<()> {
    match cmd {
        TestCommand::Webhook {
            environment,
            payload,
        } => test_webhook(ctx, environment, payload).await,
        TestCommand::Endpoint { url } => {
            let url = match url {
                Some(url) => url,
                None => ctx
                    .record()?
                    .current_endpoint()
                    .map(str::to_string)
                    .ok_or_else(|| ConfigError::NotFound {
                        subject: Subject::Environment,
                        name: "<current>".to_string(),
                    })?,
            };
            filter::validate_endpoint_url(&url)?;
            let settings = endpoint_check::check_settings(&ctx.settings);
            let report = endpoint_check::check_endpoint(&url, &settings).await?;
            ctx.out.emit(&report, || format_endpoint_report(&report))
        }
        TestCommand::Validate => {
            let record = ctx.record()?;
            let report = check::check_record(&record);
            ctx.out.emit(&report, || format_record_check(&record.name, &report))?;
            if report.is_valid() {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    field: "profile",
                    value: record.name,
                    expected: format!("a complete profile ({} issue(s) found)", report.issues.len()),
                }
                .into())
            }
        }
    }
}

async fn test_webhook(
    ctx: &Context,
    environment: Option<String>,
    payload: Option<PathBuf>,
) -> Result<()> {
    let payload = payload.map(|path| read_payload(&path)).transpose()?;
    let (record, client) = ctx.client()?;

    let environment = match environment.or(record.current_environment) {
        Some(env) => env,
        None => {
            return Err(ConfigError::NotFound {
                subject: Subject::Environment,
                name: "<current>".to_string(),
            }
            .into())
        }
    };

    let result = client
        .send_test_webhook(&environment, payload.as_ref())
        .await?;
    ctx.out.emit(&result, || {
        format!("Test webhook sent to '{environment}'.\n{}", pretty(&result))
    })
}

fn read_payload(path: &std::path::Path) -> Result<serde_json::Value> {
    let text = std::fs::read_to_string(path).map_err(|source| RelayError::Io {
        path: path.to_path_buf(),
        operation: "read payload",
        source,
    })?;
    serde_json::from_str(&text).map_err(|e| {
        ValidationError::InvalidPayload {
            path: path.to_path_buf(),
            detail: e.to_string(),
        }
        .into()
    })
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn format_endpoint_report(report: &EndpointReport) -> String {
    format!(
        "Endpoint:       {}\nStatus:         {} ({})\nResponse time:  {}ms\nContent length: {} bytes",
        report.url,
        report.status,
        if report.reachable { "reachable" } else { "server error" },
        report.elapsed_ms,
        report.bytes
    )
}

fn format_record_check(profile: &str, report: &RecordCheck) -> String {
    let mut lines = Vec::new();
    if report.is_valid() {
        lines.push(format!("Profile '{profile}' is valid."));
    } else {
        lines.push(format!("Profile '{profile}' has issues:"));
        lines.extend(report.issues.iter().map(|i| format!("  - {i}")));
    }
    if !report.warnings.is_empty() {
        lines.push("Warnings:".to_string());
        lines.extend(report.warnings.iter().map(|w| format!("  - {w}")));
    }
    lines.join("\n")
}

fn format_status(status: &WebhookStatus) -> String {
    let mut lines = vec![
        format!("Total webhooks:    {}", status.total_webhooks),
        format!("Successful:        {}", status.successful),
        format!("Failed:            {}", status.failed),
        format!("Pending:           {}", status.pending),
        format!("Success rate:      {:.1}%", status.success_rate),
        format!("Avg response time: {:.0}ms", status.avg_response_time),
    ];
    let mut envs: Vec<_> = status.environments.iter().collect();
    envs.sort_by(|a, b| a.0.cmp(b.0));
    for (name, health) in envs {
        lines.push(format!(
            "  {:<12} {:<10} {:.1}%  last success: {}",
            name,
            health.status.as_deref().unwrap_or("-"),
            health.success_rate,
            health.last_success.as_deref().unwrap_or("-"),
        ));
    }
    lines.join("\n")
}

fn format_metrics(days: u32, metrics: &Metrics) -> String {
    let mut lines = vec![
        format!("Last {days} days"),
        format!("Total webhooks: {}", metrics.total_webhooks),
        format!(
            "Successful:     {}  Failed: {}  ({:.1}% success)",
            metrics.successful, metrics.failed, metrics.success_rate
        ),
        format!(
            "Response time:  avg {:.0}ms  min {:.0}ms  max {:.0}ms",
            metrics.avg_response_time, metrics.min_response_time, metrics.max_response_time
        ),
    ];
    let mut errors: Vec<_> = metrics.error_breakdown.iter().collect();
    errors.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (kind, count) in errors {
        lines.push(format!("  {kind}: {count}"));
    }
    for day in &metrics.daily_stats {
        lines.push(format!(
            "  {}  {:>6} webhooks  {:.1}%  {:.0}ms",
            day.date, day.total_webhooks, day.success_rate, day.avg_response_time
        ));
    }
    lines.join("\n")
}
