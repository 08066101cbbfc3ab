// relayctl - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. State directory and config.toml resolution
// 3. Logging initialisation (debug mode support)
// 4. Single-threaded async runtime
// 5. Mapping errors to exit codes

mod cli;

use clap::Parser;
use relayctl::app::api_client::ClientSettings;
use relayctl::app::profile_store::ProfileStore;
use relayctl::platform::config::{load_config, PlatformPaths};
use relayctl::util;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

fn main() -> ExitCode {
    let args = cli::Cli::parse();

    // Paths first: config.toml may set the log level.
    let (paths, path_warning) = PlatformPaths::resolve(args.home.as_deref());
    let (config, config_warnings) = load_config(&paths.config_file);

    util::logging::init(args.debug, config.log_level.as_deref());
    if let Some(warning) = &path_warning {
        tracing::warn!(warning = %warning, "State directory fallback");
    }
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config file warning");
    }

    tracing::debug!(
        version = util::constants::APP_VERSION,
        root = %paths.root_dir.display(),
        profiles = %paths.profiles_dir.display(),
        "relayctl starting"
    );

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let ctx = cli::Context {
        store: ProfileStore::from_paths(&paths),
        settings: ClientSettings::from(&config),
        config,
        profile: args.profile,
        out: cli::Printer::new(args.json),
        cancel: CancellationToken::new(),
    };

    let result = runtime.block_on(cli::run(&ctx, args.command));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
