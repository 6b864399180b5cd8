mod app_logic;
mod core;
mod platform_layer;

use crate::app_logic::SyncController;
use crate::core::{CoreSettingsStore, ExternalParserFactory, ParserCommand, default_settings_path};
use crate::platform_layer::{EventRouter, StdioHost};
use clap::{Parser, ValueEnum};
use simplelog::{ConfigBuilder, LevelFilter};
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Once};

// Used for the default settings location.
const APP_NAME: &str = "SaplingSync";

static LOGGING_INIT: Once = Once::new();

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/*
 * Keeps a Sapling component-tree panel in sync with a host editor.
 * Host events are read as JSON lines from stdin; panel messages and host requests are
 * written as JSON lines to stdout. Logs go to stderr.
 */
#[derive(Debug, Parser)]
#[command(
    name = "sapling_sync",
    version,
    about = "Keeps a Sapling component-tree panel in sync with a host editor."
)]
struct Cli {
    /// Settings file holding the `sapling.view` options. Defaults to the per-user config directory.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Log verbosity on stderr.
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Parser command; `{file}` is replaced by the entry file, or the file is appended.
    #[arg(last = true, required = true, value_name = "PARSER")]
    parser_command: Vec<String>,
}

/*
 * Sets up `simplelog` on stderr, since stdout carries the protocol. Safe to call more
 * than once; only the first call has an effect.
 */
fn init_logging(level: LevelFilter) {
    LOGGING_INIT.call_once(|| {
        let config = ConfigBuilder::new()
            .set_thread_level(LevelFilter::Off)
            .set_target_level(LevelFilter::Error)
            .build();
        #[cfg(test)]
        let result = simplelog::TestLogger::init(level, config);
        #[cfg(not(test))]
        let result = simplelog::TermLogger::init(
            level,
            config,
            simplelog::TerminalMode::Stderr,
            simplelog::ColorChoice::Auto,
        );
        if let Err(e) = result {
            eprintln!("Failed to initialize logger: {e}");
        }
    });
}

#[cfg(test)]
pub(crate) fn initialize_logging() {
    init_logging(LevelFilter::Debug);
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let command = ParserCommand::from_argv(&cli.parser_command)?;
    let settings_path = match cli.settings {
        Some(path) => path,
        None => default_settings_path(APP_NAME)?,
    };

    let settings_store = Arc::new(CoreSettingsStore::new(settings_path));
    log::info!("Main: Using settings from {:?}", settings_store.settings_path());

    let host = Arc::new(StdioHost::new(Box::new(io::stdout())));
    let router = EventRouter::new();
    router.subscribe(Box::new(host.event_source(BufReader::new(io::stdin()))))?;

    let mut controller = SyncController::new(
        Arc::new(ExternalParserFactory::new(command)),
        settings_store,
        Arc::clone(&host) as Arc<dyn platform_layer::DocumentHostOperations>,
        host.panel_surface(),
    );

    log::info!("Main: Waiting for host events.");
    router.run(&mut controller);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.into());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Main: {e}");
            ExitCode::FAILURE
        }
    }
}
