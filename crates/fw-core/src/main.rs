//! Fare Watch Core - evasion estimation and rolling monitoring
//!
//! The main entry point for fw-core, handling:
//! - Rules and data-table resolution
//! - The load → estimate → merge → simulate → aggregate pipeline
//! - Rendering each view as JSON, Markdown or a one-line summary

use std::io::Write;
use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use fw_common::{Error, OutputFormat, StructuredError, SCHEMA_VERSION};
use fw_config::{load_rules, resolve_data_paths, resolve_rules, RulesSnapshot};
use fw_core::context::PipelineContext;
use fw_core::estimate::{UniformSampler, VarianceSampler};
use fw_core::exit_codes::ExitCode;
use fw_core::log_event;
use fw_core::logging::{event_names, init_logging, LogConfig, LogContext, Stage, Verbosity};
use fw_core::output::{render, RenderMeta};

/// Fare Watch Core - fare-evasion estimation and monitoring
#[derive(Parser)]
#[command(name = "fw-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Baseline ridership table (expected.csv)
    #[arg(long, global = true)]
    baseline: Option<PathBuf>,

    /// Sampled tap-on table (sample_tap_on_dataset.csv)
    #[arg(long, global = true)]
    sample: Option<PathBuf>,

    /// Rules file overriding the built-in business constants
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Seed the variance sampler for reproducible estimates
    #[arg(long, global = true, env = "FARE_WATCH_SEED")]
    seed: Option<u64>,

    /// Simulation clock as "YYYY-MM-DD HH:MM:SS" (defaults to local now)
    #[arg(long, global = true, value_parser = parse_now)]
    now: Option<NaiveDateTime>,
}

#[derive(Subcommand)]
enum Commands {
    /// Network-wide statistics
    Summary,

    /// Busiest stations by annual ridership
    Top(TopArgs),

    /// Every station, busiest first
    Stations,

    /// Per-station evasion, highest first
    Evasion,

    /// Station-level evasion alerts
    Alerts,

    /// Rolling 24-hour events and hourly alerts
    Realtime,

    /// Simplified route cards
    Routes,

    /// Dashboard overview
    Overview,

    /// Validate rules and report resolved data paths
    Check,
}

#[derive(Args, Debug)]
struct TopArgs {
    /// Number of stations (defaults to the rules' top_stations)
    #[arg(long, short = 'n')]
    limit: Option<usize>,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Summary => "summary",
            Commands::Top(_) => "top",
            Commands::Stations => "stations",
            Commands::Evasion => "evasion",
            Commands::Alerts => "alerts",
            Commands::Realtime => "realtime",
            Commands::Routes => "routes",
            Commands::Overview => "overview",
            Commands::Check => "check",
        }
    }
}

fn parse_now(raw: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(raw, fw_core::timestamp::FORMAT)
        .map_err(|e| format!("expected YYYY-MM-DD HH:MM:SS: {e}"))
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and are not failures.
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = e.print();
            std::process::exit(code.as_i32());
        }
    };

    init_logging(&LogConfig::resolve(Verbosity {
        verbose: cli.global.verbose,
        quiet: cli.global.quiet,
    }));

    let log = LogContext::generate();
    let command = cli.command.name();
    log_event!(
        log,
        INFO,
        event_names::RUN_STARTED,
        Stage::Init,
        "starting command",
        command = command
    );

    let exit_code = match cli.command {
        Commands::Check => run_check(&cli.global, &log),
        _ => run_view(&cli, &log),
    };

    let code_name = exit_code.code_name();
    log_event!(
        log,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Render,
        "command finished",
        command = command,
        exit_code = code_name
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

/// Run the pipeline and print one view.
///
/// A failed load still prints the (empty) view; the exit code reports why.
fn run_view(cli: &Cli, log: &LogContext) -> ExitCode {
    let global = &cli.global;
    let (rules, rules_snapshot) = match load_rules(global.rules.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            let message = e.to_string();
            log_event!(
                log,
                ERROR,
                event_names::RULES_ERROR,
                Stage::Init,
                "rules rejected",
                error = message.as_str()
            );
            let err = Error::from(e);
            report_error(global, &err);
            return ExitCode::from(&err);
        }
    };
    log_rules(log, &rules_snapshot);

    let paths = resolve_data_paths(global.baseline.as_deref(), global.sample.as_deref());
    let sampler: Box<dyn VarianceSampler> = match global.seed {
        Some(seed) => Box::new(UniformSampler::seeded(seed)),
        None => Box::new(UniformSampler::from_entropy()),
    };
    let ctx = PipelineContext::new(rules, paths, sampler, log.clone());

    let mut exit_code = match ctx.reload() {
        Ok(snapshot) if snapshot.has_data() => ExitCode::Clean,
        Ok(_) => ExitCode::NoData,
        Err(e) => {
            report_error(global, &e);
            ExitCode::from(&e)
        }
    };

    let snapshot = ctx.stations();
    let views = snapshot.views(ctx.rules());
    let now = global.now.unwrap_or_else(|| Local::now().naive_local());
    let meta = RenderMeta {
        command: cli.command.name(),
        run_id: &log.run_id,
        status: snapshot.status,
        rules: &rules_snapshot,
    };
    let format = global.format;

    let rendered = match &cli.command {
        Commands::Summary => render(format, &meta, &views.summary()),
        Commands::Top(args) => {
            let limit = args.limit.unwrap_or(ctx.rules().views.top_stations);
            render(format, &meta, views.top_stations(limit))
        }
        Commands::Stations => render(format, &meta, views.stations()),
        Commands::Evasion => render(format, &meta, views.evasion_summary().as_slice()),
        Commands::Alerts => render(format, &meta, views.station_alerts(now).as_slice()),
        Commands::Realtime => {
            let stream = ctx.refresh_realtime(now);
            render(format, &meta, &views.realtime_feed(&stream))
        }
        Commands::Routes => render(format, &meta, views.routes().as_slice()),
        Commands::Overview => render(format, &meta, &views.overview(now)),
        Commands::Check => return run_check(global, log),
    };

    if let Err(e) = rendered.and_then(|text| print_payload(&text)) {
        report_error(global, &e);
        exit_code = ExitCode::from(&e);
    }
    exit_code
}

/// Validate the rules and report where every input resolves to.
fn run_check(global: &GlobalOpts, log: &LogContext) -> ExitCode {
    let mut results: Vec<serde_json::Value> = Vec::new();
    let mut exit_code = ExitCode::Clean;

    let resolved = resolve_rules(global.rules.as_deref());
    match load_rules(global.rules.as_deref()) {
        Ok((_, snapshot)) => {
            log_rules(log, &snapshot);
            results.push(serde_json::json!({
                "check": "rules",
                "status": "ok",
                "source": resolved.source.to_string(),
                "path": snapshot.path,
                "hash": snapshot.hash,
                "schema_version": snapshot.schema_version,
            }));
        }
        Err(e) => {
            exit_code = ExitCode::ConfigError;
            results.push(serde_json::json!({
                "check": "rules",
                "status": "error",
                "source": resolved.source.to_string(),
                "path": resolved.path.as_ref().map(|p| p.display().to_string()),
                "error": e.to_string(),
            }));
        }
    }

    let paths = resolve_data_paths(global.baseline.as_deref(), global.sample.as_deref());
    for (name, path, source) in [
        ("baseline", &paths.baseline, paths.baseline_source),
        ("sample", &paths.sample, paths.sample_source),
    ] {
        let found = path.is_file();
        if !found && exit_code == ExitCode::Clean {
            exit_code = ExitCode::SourceUnavailable;
        }
        results.push(serde_json::json!({
            "check": name,
            "status": if found { "ok" } else { "error" },
            "source": source.to_string(),
            "path": path.display().to_string(),
            "note": if found { "table found" } else { "file not found" },
        }));
    }

    let all_ok = exit_code == ExitCode::Clean;
    let text = match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": log.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "command": "check",
                "status": if all_ok { "ok" } else { "error" },
                "checks": results,
            });
            serde_json::to_string_pretty(&response).map_err(Error::from)
        }
        OutputFormat::Summary => {
            let status = if all_ok { "OK" } else { "FAILED" };
            Ok(format!("[{}] check: {}", log.run_id, status))
        }
        OutputFormat::Md => {
            let mut out = String::from("# fw-core check\n\n");
            for result in &results {
                let check = result.get("check").and_then(|v| v.as_str()).unwrap_or("?");
                let status = result.get("status").and_then(|v| v.as_str()).unwrap_or("?");
                let symbol = if status == "ok" { "✓" } else { "✗" };
                out.push_str(&format!("{} {}: {}\n", symbol, check, status));
                if let Some(path) = result.get("path").and_then(|v| v.as_str()) {
                    out.push_str(&format!("  Path: {}\n", path));
                }
                if let Some(error) = result.get("error").and_then(|v| v.as_str()) {
                    out.push_str(&format!("  Error: {}\n", error));
                }
            }
            Ok(out)
        }
    };

    match text.and_then(|t| print_payload(&t)) {
        Ok(()) => exit_code,
        Err(e) => {
            report_error(global, &e);
            ExitCode::from(&e)
        }
    }
}

fn log_rules(log: &LogContext, snapshot: &RulesSnapshot) {
    match snapshot.path.as_deref() {
        Some(path) => log_event!(
            log,
            INFO,
            event_names::RULES_LOADED,
            Stage::Init,
            "rules loaded",
            path = path,
            hash = snapshot.hash.as_str()
        ),
        None => log_event!(
            log,
            DEBUG,
            event_names::RULES_DEFAULT_USED,
            Stage::Init,
            "using built-in rules"
        ),
    }
}

/// Write a payload to stdout.
fn print_payload(text: &str) -> fw_common::Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", text)?;
    stdout.flush()?;
    Ok(())
}

/// Report an error on stderr in the style of the requested format.
fn report_error(global: &GlobalOpts, err: &Error) {
    let structured = StructuredError::from(err);
    match global.format {
        OutputFormat::Json => eprintln!("{}", structured.to_json()),
        OutputFormat::Md | OutputFormat::Summary => eprintln!("{}", structured.to_human(err)),
    }
}
