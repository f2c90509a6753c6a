//! NOMAD trend analysis CLI.
//!
//! Reads collector history from SQLite and reports, per metric stream:
//! - the current trend and its first and second derivatives
//! - projected values and days until the limit is reached
//! - an alert level, which also becomes the exit code

use chrono::{TimeDelta, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand};
use nm_common::metric::BYTES_PER_GB;
use nm_common::{
    format_error_human, Error, ErrorCategory, OutputFormat, StructuredError, SCHEMA_VERSION,
};
use nm_core::config::{
    list_presets, load_config, load_file, ConfigOptions, ConfigSource, ResolvedConfig,
};
use nm_core::diag::analyze_series;
use nm_core::exit_codes::ExitCode;
use nm_core::log_event;
use nm_core::logging::{
    event_names, generate_run_id, get_host_id, init_logging, LogConfig, LogContext, LogFormat,
    LogLevel, Stage,
};
use nm_core::output::{render_analyze, render_sweep, AnalyzeReport};
use nm_core::schema::{
    available_schemas, format_schema, generate_all_schemas, generate_schema, SchemaFormat,
};
use nm_core::sweep::{AlertSweep, WindowRegistry};
use nm_core::AlertLevel;
use nm_history::{default_db_path, HistoryStore, MetricSelector};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// NOMAD trend analysis - derivative-based forecasting for cluster telemetry
#[derive(Parser)]
#[command(name = "nm-core")]
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
    /// Path to analyzer.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use a built-in preset instead of analyzer.json
    #[arg(long, global = true)]
    preset: Option<String>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "md")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

impl GlobalOpts {
    fn config_options(&self) -> ConfigOptions {
        ConfigOptions {
            config_path: self.config.clone(),
            preset: self.preset.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the trend of one metric stream
    Analyze(AnalyzeArgs),

    /// Re-analyze streams on a timer and report alert changes
    Watch(WatchArgs),

    /// Inspect and validate configuration
    Config(ConfigArgs),

    /// Print JSON Schema for output types
    Schema(SchemaArgs),

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["path", "metric"])))]
struct AnalyzeArgs {
    /// Filesystem path (shorthand for --metric fs:<path>)
    #[arg(short, long)]
    path: Option<String>,

    /// Metric selector: fs:<path>, ws:<host>:memory|disk|load, storage:<host>
    #[arg(long)]
    metric: Option<String>,

    /// Hours of history to analyze
    #[arg(long, default_value_t = 24)]
    hours: u32,

    /// Limit in raw units (bytes, percent, load)
    #[arg(long, conflicts_with = "limit_gb")]
    limit: Option<f64>,

    /// Limit in GB
    #[arg(long)]
    limit_gb: Option<f64>,

    /// History database path
    #[arg(long, env = "NM_DB")]
    db: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Metric selectors to track (repeatable)
    #[arg(long = "metric", required = true)]
    metrics: Vec<String>,

    /// Seconds between sweeps
    #[arg(long, default_value_t = 300)]
    interval: u64,

    /// Stop after this many sweeps
    #[arg(long)]
    iterations: Option<u64>,

    /// Hours of history replayed by the first sweep
    #[arg(long, default_value_t = 24)]
    hours: u32,

    /// Limit applied to every stream instead of its implicit one
    #[arg(long)]
    limit: Option<f64>,

    /// History database path
    #[arg(long, env = "NM_DB")]
    db: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the resolved analyzer.json)
        path: Option<PathBuf>,
    },

    /// List built-in presets
    Presets,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Type to print (all types when omitted)
    #[arg(value_name = "TYPE")]
    type_name: Option<String>,

    /// List available types
    #[arg(long)]
    list: bool,

    /// Single-line JSON
    #[arg(long)]
    compact: bool,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else if cli.global.verbose > 0 {
        Some(LogLevel::Warn.louder(cli.global.verbose))
    } else {
        None
    };
    // Machine-readable stdout gets machine-readable stderr.
    let cli_format = cli.global.format.is_machine().then_some(LogFormat::Jsonl);
    init_logging(&LogConfig::from_env(cli_level, cli_format));

    let ctx = LogContext::new(generate_run_id(), get_host_id());
    let run_span = tracing::info_span!("run", run_id = %ctx.run_id, host_id = %ctx.host_id);
    let _guard = run_span.enter();
    log_event!(ctx, DEBUG, event_names::RUN_STARTED, Stage::Init, "run started",
        version = env!("CARGO_PKG_VERSION"));

    let exit_code = match &cli.command {
        Commands::Analyze(args) => run_analyze(&cli.global, args, &ctx),
        Commands::Watch(args) => run_watch(&cli.global, args, &ctx),
        Commands::Config(args) => run_config(&cli.global, args),
        Commands::Schema(args) => run_schema(args),
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    log_event!(ctx, DEBUG, event_names::RUN_FINISHED, Stage::Report, "run finished",
        exit_code = exit_code.as_i32());
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// analyze
// ============================================================================

fn run_analyze(global: &GlobalOpts, args: &AnalyzeArgs, ctx: &LogContext) -> ExitCode {
    match analyze(global, args, ctx) {
        Ok(code) => code,
        Err(e) => output_error(global, &e),
    }
}

fn analyze(global: &GlobalOpts, args: &AnalyzeArgs, ctx: &LogContext) -> Result<ExitCode, Error> {
    let resolved = load_config(&global.config_options())?;
    let settings = resolved.settings();

    let selector = match (&args.path, &args.metric) {
        (Some(path), _) => MetricSelector::filesystem(path.as_str()),
        (None, Some(metric)) => metric.parse::<MetricSelector>()?,
        (None, None) => return Err(Error::UnknownSelector(String::new())),
    };
    let ctx = ctx.for_stream(selector.to_string());

    let store = HistoryStore::open(&resolve_db_path(args.db.as_deref())?)?;
    let since = TimeDelta::try_hours(i64::from(args.hours)).and_then(|d| Utc::now().checked_sub_signed(d));

    log_event!(ctx, INFO, event_names::ANALYZE_STARTED, Stage::Ingest, "loading history",
        hours = args.hours);
    let series = store.series(&selector, since)?;
    log_event!(ctx, DEBUG, event_names::HISTORY_LOADED, Stage::Ingest, "history loaded",
        rows = series.len(), skipped = series.skipped_rows);
    if series.is_empty() {
        return Err(Error::NoData {
            selector: selector.to_string(),
        });
    }

    let limit = args.limit.or(args.limit_gb.map(|gb| gb * BYTES_PER_GB));
    let (analysis, rejected) = analyze_series(&series, &settings, limit);
    if analysis.alert_level >= AlertLevel::Warning {
        log_event!(ctx, WARN, event_names::ALERT_RAISED, Stage::Alert, "alert raised",
            level = analysis.alert_level.as_str(), trend = analysis.trend.as_str());
    }

    let report = AnalyzeReport::new(
        ctx.run_id.clone(),
        selector.to_string(),
        series.kind,
        args.hours,
        series.skipped_rows + rejected,
        analysis,
        resolved.snapshot(),
    );
    if let Some(text) = render_analyze(&report, global.format) {
        println!("{}", text);
    }
    Ok(ExitCode::from_alert_level(report.analysis.alert_level))
}

/// `--db`, then `NM_DB` (via clap), then the data directory.
fn resolve_db_path(cli: Option<&Path>) -> Result<PathBuf, Error> {
    cli.map(Path::to_path_buf)
        .or_else(default_db_path)
        .ok_or_else(|| Error::DatabaseNotFound {
            path: "<no data directory>".to_string(),
        })
}

// ============================================================================
// watch
// ============================================================================

fn run_watch(global: &GlobalOpts, args: &WatchArgs, ctx: &LogContext) -> ExitCode {
    match watch(global, args, ctx) {
        Ok(code) => code,
        Err(e) => output_error(global, &e),
    }
}

fn watch(global: &GlobalOpts, args: &WatchArgs, ctx: &LogContext) -> Result<ExitCode, Error> {
    let resolved = load_config(&global.config_options())?;
    let selectors = args
        .metrics
        .iter()
        .map(|m| m.parse::<MetricSelector>())
        .collect::<Result<Vec<_>, _>>()?;
    let store = HistoryStore::open(&resolve_db_path(args.db.as_deref())?)?;

    let registry = WindowRegistry::new(resolved.settings())?;
    let start = TimeDelta::try_hours(i64::from(args.hours)).and_then(|d| Utc::now().checked_sub_signed(d));
    let mut sweep = AlertSweep::new(registry, selectors, start, ctx.clone()).with_limit(args.limit);

    let interval = std::time::Duration::from_secs(args.interval);
    let level = loop {
        let report = sweep.tick(&store);
        if let Some(text) = render_sweep(&report, global.format) {
            println!("{}", text);
        }
        if args.iterations.is_some_and(|n| sweep.ticks() >= n) {
            break report.max_level();
        }
        std::thread::sleep(interval);
    };
    Ok(ExitCode::from_alert_level(level))
}

// ============================================================================
// config
// ============================================================================

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> ExitCode {
    let result = match &args.command {
        ConfigCommands::Show => load_config(&global.config_options()).map(|r| {
            print_config(global, &r, "effective configuration");
        }),
        ConfigCommands::Validate { path } => {
            let loaded = match path {
                Some(p) => load_file(p, ConfigSource::CliArgument),
                None => load_config(&global.config_options()),
            };
            loaded.map(|r| print_config(global, &r, "configuration is valid"))
        }
        ConfigCommands::Presets => {
            print_presets(global);
            Ok(())
        }
    };
    match result {
        Ok(()) => ExitCode::Clean,
        Err(e) => output_error(global, &e.into()),
    }
}

fn print_config(global: &GlobalOpts, resolved: &ResolvedConfig, headline: &str) {
    match global.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "snapshot": resolved.snapshot(),
                "config": resolved.config,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
        }
        OutputFormat::Exitcode => {}
        _ => {
            let c = &resolved.config;
            println!("{} ({})", headline, resolved.source);
            if let Some(path) = &resolved.path {
                println!("  path:                          {}", path.display());
            }
            if let Some(preset) = resolved.preset {
                println!("  preset:                        {}", preset.as_str());
            }
            println!("  window_size:                   {}", c.window_size);
            println!("  min_points_for_classification: {}", c.min_points_for_classification);
            println!("  absolute_noise_floor:          {}", c.absolute_noise_floor);
            println!("  relative_noise_fraction:       {}", c.relative_noise_fraction);
            println!("  small_sample_noise_multiplier: {}", c.small_sample_noise_multiplier);
            println!("  alerts.critical_days:          {}", c.alerts.critical_days);
            println!("  alerts.warning_days:           {}", c.alerts.warning_days);
        }
    }
}

fn print_presets(global: &GlobalOpts) {
    let presets = list_presets();
    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&presets).unwrap_or_default());
        }
        OutputFormat::Exitcode => {}
        _ => {
            for p in presets {
                println!("{:<14} window {:>4}  {}", p.name.as_str(), p.window_size, p.description);
            }
        }
    }
}

// ============================================================================
// schema / version / errors
// ============================================================================

fn run_schema(args: &SchemaArgs) -> ExitCode {
    let format = if args.compact {
        SchemaFormat::JsonCompact
    } else {
        SchemaFormat::Json
    };
    match &args.type_name {
        Some(name) if !args.list => match generate_schema(name) {
            Some(schema) => {
                println!("{}", format_schema(&schema, format));
                ExitCode::Clean
            }
            None => {
                eprintln!("unknown schema type '{}'; see `nm-core schema --list`", name);
                ExitCode::ArgsError
            }
        },
        _ if args.list => {
            for (name, description) in available_schemas() {
                println!("{:<16} {}", name, description);
            }
            ExitCode::Clean
        }
        _ => {
            let all = serde_json::to_value(generate_all_schemas()).unwrap_or_default();
            println!("{}", format_schema(&all, format));
            ExitCode::Clean
        }
    }
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "nm_core_version": env!("CARGO_PKG_VERSION"),
        "config_schema_version": nm_core::config::CONFIG_SCHEMA_VERSION,
    });

    match global.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&version_info).unwrap_or_default());
        }
        OutputFormat::Exitcode => {}
        _ => {
            println!("nm-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}

/// Print an error in the requested format and pick its exit code.
fn output_error(global: &GlobalOpts, error: &Error) -> ExitCode {
    let code = ExitCode::from_error(error);
    if error.category() == ErrorCategory::Config {
        tracing::warn!(target: event_names::CONFIG_ERROR, code = error.code(), "configuration rejected");
    } else {
        tracing::debug!(target: event_names::INTERNAL_ERROR, code = error.code(), "command failed");
    }
    match global.format {
        OutputFormat::Json => {
            let structured = StructuredError::from(error).with_context("exit_code", code.code_name());
            println!("{}", structured.to_json_pretty());
        }
        OutputFormat::Exitcode => {}
        _ => {
            eprintln!("{}", format_error_human(error, std::io::stderr().is_terminal()));
        }
    }
    code
}
