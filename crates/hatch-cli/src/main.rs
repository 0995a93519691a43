use std::ffi::OsString;
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand};
use hatch_core::{classify, run_external, CommandCatalog, CommandError, REPORT_INSTALL_SUCCESS_VERB};
use hatch_telemetry::{
    capture_failures, load_telemetry_config, report_install_success, CollectorSubscriber,
    CommonProperties, EventBus, HashingFilter, Redactor, TelemetryConfig,
};
use tracing_subscriber::EnvFilter;

mod error;
mod telemetry_cmd;

use error::CliError;
use telemetry_cmd::TelemetryAction;

/// Longest time spent flushing telemetry before exit
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "hatch", version, about = "hatch CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect or change telemetry settings
    Telemetry {
        #[command(subcommand)]
        action: TelemetryAction,
    },
    /// Any other verb runs the `hatch-<verb>` executable
    #[command(external_subcommand)]
    External(Vec<OsString>),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    // Raw arguments go to clap and the external command untouched; telemetry
    // only ever sees the lossy UTF-8 view.
    let raw_args: Vec<OsString> = std::env::args_os().skip(1).collect();
    let argv: Vec<String> = raw_args
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let catalog = Arc::new(CommandCatalog::builtin());
    let config = load_telemetry_config().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "using default telemetry config");
        TelemetryConfig::default()
    });
    let (bus, collector) = build_bus(&config, &catalog);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run(&raw_args, &argv, &catalog, &config, &bus)));

    if let Some(collector) = collector {
        collector.shutdown(FLUSH_TIMEOUT).await;
    }

    match outcome {
        Ok(code) => ExitCode::from(exit_status_byte(code)),
        Err(payload) => panic::resume_unwind(payload),
    }
}

/// Status byte reported for `code`
///
/// Unix child statuses already fit in a byte. Wider codes (Windows) keep
/// their low byte, and a nonzero code whose low byte is zero becomes 1 so
/// failure is never reported as success.
fn exit_status_byte(code: i32) -> u8 {
    match u8::try_from(code) {
        Ok(byte) => byte,
        Err(_) => match (code & 0xff) as u8 {
            0 => 1,
            byte => byte,
        },
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_env("HATCH_LOG").unwrap_or_else(|_| EnvFilter::new("error"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// One bus per process: hashing filter plus the collector when allowed
fn build_bus(
    config: &TelemetryConfig,
    catalog: &Arc<CommandCatalog>,
) -> (EventBus, Option<Arc<CollectorSubscriber>>) {
    let bus = EventBus::new();
    bus.configure_filter(Arc::new(HashingFilter::sha256(Arc::clone(catalog))));

    if !(config.enabled || config.debug) {
        return (bus, None);
    }

    let common = CommonProperties::collect(env!("CARGO_PKG_VERSION"));
    match CollectorSubscriber::spawn(config, common) {
        Ok(collector) => {
            let collector = Arc::new(collector);
            bus.subscribe(collector.clone());
            (bus, Some(collector))
        }
        Err(e) => {
            tracing::debug!(error = %e, "telemetry collector unavailable");
            (bus, None)
        }
    }
}

/// Observe, dispatch and return the exit code
fn run(
    raw_args: &[OsString],
    argv: &[String],
    catalog: &CommandCatalog,
    config: &TelemetryConfig,
    bus: &EventBus,
) -> i32 {
    let internal = argv
        .first()
        .and_then(|verb| catalog.lookup(verb))
        .filter(|entry| entry.is_internal());
    if let Some(entry) = internal {
        if entry.verb == REPORT_INSTALL_SUCCESS_VERB {
            if let Some(path) = argv.get(1) {
                report_install_success(bus, path);
            }
        }
        return 0;
    }

    bus.publish_invocation(&classify(catalog, argv));

    let cli = match Cli::try_parse_from(std::iter::once(OsString::from("hatch")).chain(raw_args.iter().cloned())) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return err.exit_code();
        }
    };

    let redactor = Redactor::for_invocation(argv);
    match capture_failures(bus, &redactor, || dispatch(cli, config)) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", anyhow::Error::from(err));
            1
        }
    }
}

fn dispatch(cli: Cli, config: &TelemetryConfig) -> Result<i32, CliError> {
    match cli.cmd {
        None => {
            Cli::command().print_help()?;
            Ok(0)
        }
        Some(Command::Telemetry { action }) => telemetry_cmd::execute(action, config),
        Some(Command::External(args)) => match args.split_first() {
            Some((verb, rest)) => {
                let verb = verb.to_str().ok_or_else(|| CommandError::InvalidVerb {
                    verb: verb.to_string_lossy().into_owned(),
                })?;
                Ok(run_external(verb, rest)?)
            }
            None => Ok(0),
        },
    }
}
