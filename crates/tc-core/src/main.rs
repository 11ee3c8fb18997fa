//! tc-core: token concurrency analysis over session logs.
//!
//! stdout carries the payload (JSON, Markdown or a one-line summary);
//! logs, progress events and errors go to stderr.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use tc_common::error::{format_error_human, StructuredError};
use tc_common::{AnalysisId, Error, OutputFormat, Result, TagKind, SCHEMA_VERSION};
use tc_core::config::{load_config, AnalysisConfig, ConfigSnapshot, ResolvedConfig};
use tc_core::events::{
    event_names as progress_names, AnalysisEmitter, JsonlWriter, NullEmitter, Phase,
    ProgressEmitter, ProgressEvent,
};
use tc_core::exit_codes::ExitCode;
use tc_core::ingest::{read_source, SourceFormat};
use tc_core::log_event;
use tc_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use tc_core::output::{
    render, CalendarReport, Envelope, FullReport, HistogramReport, InputSummary,
    OccurrencesReport, PeriodsReport, Render, StatsReport, UsageReport,
};
use tc_core::runner::{AnalysisOutput, AnalysisRequest, AnalysisRunner, Dataset};
use tc_engine::{
    aggregate_non_overlapping, available_months, daily_volume, group_by_entity, login_heatmap,
    month_bounds, rank_by_active_time, rank_by_reported_duration, within_dates, CapacityPolicy,
    EntityKind, HeatmapGrouping, NormalizedRecord, Normalizer, ResourceModel, YearMonth,
};

// ============================================================================
// CLI definition
// ============================================================================

/// Token concurrency analysis over session logs
#[derive(Parser, Debug)]
#[command(name = "tc-core", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Session source: .csv, .json (array) or .jsonl; `-` reads JSON Lines from stdin
    #[arg(long, short = 'i', global = true, env = "TC_INPUT")]
    input: Option<PathBuf>,

    /// Analysis config file (analysis.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// First session start date to include (YYYY-MM-DD)
    #[arg(long, global = true)]
    from: Option<NaiveDate>,

    /// Last session start date to include (YYYY-MM-DD)
    #[arg(long, global = true)]
    to: Option<NaiveDate>,

    /// Restrict to one month (YYYY-MM)
    #[arg(long, global = true, conflicts_with_all = ["from", "to"])]
    month: Option<YearMonth>,

    /// Abort if the analysis exceeds this many seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Emit JSONL progress events on stderr
    #[arg(long, global = true)]
    progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Worst-case and average concurrency with a token recommendation
    Stats,

    /// Time spent at each token usage level
    Histogram(HistogramArgs),

    /// Windows where token usage stayed at or above a threshold
    Periods(PeriodsArgs),

    /// Instants where token usage became exactly a value
    Occurrences(OccurrencesArgs),

    /// Non-overlapping active time per user, product or server
    Usage(UsageArgs),

    /// Months, daily volume and hour-of-day login heatmap
    Calendar(CalendarArgs),

    /// Every analysis for the selection in one payload
    Report,

    /// Configuration management
    Config(ConfigArgs),

    /// Print version information
    Version,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Stats => "stats",
            Commands::Histogram(_) => "histogram",
            Commands::Periods(_) => "periods",
            Commands::Occurrences(_) => "occurrences",
            Commands::Usage(_) => "usage",
            Commands::Calendar(_) => "calendar",
            Commands::Report => "report",
            Commands::Config(_) => "config",
            Commands::Version => "version",
        }
    }
}

#[derive(Args, Debug)]
struct HistogramArgs {
    /// Bucket width in tokens
    #[arg(long)]
    bin_size: Option<u32>,

    /// Concurrent users covered by one token
    #[arg(long)]
    units_per_token: Option<u32>,
}

#[derive(Args, Debug)]
struct PeriodsArgs {
    /// Token count to stay at or above (zero or less covers the whole range)
    #[arg(long, allow_hyphen_values = true)]
    threshold: Option<i64>,

    /// Concurrent users covered by one token
    #[arg(long)]
    units_per_token: Option<u32>,
}

#[derive(Args, Debug)]
struct OccurrencesArgs {
    /// Exact token count to look for
    #[arg(long)]
    threshold: Option<u64>,

    /// Concurrent users covered by one token
    #[arg(long)]
    units_per_token: Option<u32>,
}

#[derive(Args, Debug)]
struct UsageArgs {
    /// Entity to total active time for
    #[arg(long, value_enum, default_value = "user")]
    by: EntityArg,

    /// Also split each entity's time by this tag
    #[arg(long, value_enum)]
    tag: Option<TagKind>,

    /// Number of entities to list
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EntityArg {
    User,
    Product,
    Server,
}

impl From<EntityArg> for EntityKind {
    fn from(arg: EntityArg) -> Self {
        match arg {
            EntityArg::User => EntityKind::User,
            EntityArg::Product => EntityKind::Product,
            EntityArg::Server => EntityKind::Server,
        }
    }
}

#[derive(Args, Debug)]
struct CalendarArgs {
    /// Heatmap rows
    #[arg(long, value_enum, default_value = "weekday")]
    heatmap: HeatmapArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HeatmapArg {
    Weekday,
    Day,
    Month,
}

impl From<HeatmapArg> for HeatmapGrouping {
    fn from(arg: HeatmapArg) -> Self {
        match arg {
            HeatmapArg::Weekday => HeatmapGrouping::Weekday,
            HeatmapArg::Day => HeatmapGrouping::DayOfMonth,
            HeatmapArg::Month => HeatmapGrouping::Month,
        }
    }
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Print the JSON Schema of analysis.json instead
        #[arg(long)]
        schema: bool,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (defaults to the resolved config)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    init_logging(&log_config(&cli.global));
    let ctx = LogContext::new(generate_run_id());
    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_STARTED,
        Stage::Init,
        "starting",
        command = cli.command.name()
    );

    let global = &cli.global;
    let outcome = match &cli.command {
        Commands::Version => print_version(global),
        Commands::Config(args) => run_config(global, args),
        command => run_analysis(global, ctx.clone(), command),
    };

    let exit_code = match outcome {
        Ok(code) => code,
        Err(err) => {
            log_event!(
                ctx,
                DEBUG,
                event_names::INTERNAL_ERROR,
                Stage::Render,
                "command failed",
                code = u64::from(err.code())
            );
            report_error(global, &err)
        }
    };

    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Render,
        "finished",
        exit_code = i64::from(exit_code.as_i32())
    );
    std::process::exit(exit_code.as_i32());
}

fn log_config(global: &GlobalOpts) -> LogConfig {
    let level = LogLevel::from_verbosity(global.verbose, global.quiet);
    // JSON payloads get JSONL logs unless the format is pinned in the environment
    let format = (global.format.is_machine() && std::env::var_os("TC_LOG_FORMAT").is_none())
        .then_some(LogFormat::Jsonl);
    LogConfig::from_env(level, format)
}

fn use_color(global: &GlobalOpts) -> bool {
    !global.no_color && std::io::stderr().is_terminal()
}

fn report_error(global: &GlobalOpts, err: &Error) -> ExitCode {
    let code = ExitCode::from_error(err);
    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "error",
                "exit_code": code.code_name(),
                "error": StructuredError::from(err),
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&response).unwrap_or_default()
            );
        }
        OutputFormat::Exitcode => {}
        _ => eprintln!("{}", format_error_human(err, use_color(global))),
    }
    code
}

// ============================================================================
// Analysis session
// ============================================================================

/// Wall-clock budget shared by every analysis of one invocation.
struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    fn new(seconds: Option<u64>) -> Self {
        Deadline {
            started: Instant::now(),
            limit: seconds.map(Duration::from_secs),
        }
    }

    fn remaining(&self) -> Option<Duration> {
        self.limit
            .map(|limit| limit.saturating_sub(self.started.elapsed()))
    }

    fn seconds(&self) -> u64 {
        self.limit.map_or(0, |l| l.as_secs())
    }
}

/// Input after reading, normalization and date filtering.
struct Loaded {
    analysis_id: AnalysisId,
    dataset: Arc<Dataset>,
    records: Vec<NormalizedRecord>,
    input: InputSummary,
}

struct Session<'a> {
    global: &'a GlobalOpts,
    ctx: LogContext,
    config: AnalysisConfig,
    snapshot: ConfigSnapshot,
    emitter: Arc<dyn ProgressEmitter>,
    deadline: Deadline,
}

impl<'a> Session<'a> {
    fn open(global: &'a GlobalOpts, ctx: LogContext) -> Result<Self> {
        let resolved: ResolvedConfig = load_config(global.config.as_deref())?;
        let snapshot = resolved.snapshot();
        match &resolved.paths.analysis {
            Some(path) => log_event!(
                ctx,
                INFO,
                event_names::CONFIG_LOADED,
                Stage::Init,
                "configuration loaded",
                path = path.display().to_string(),
                source = resolved.paths.source.to_string(),
                hash = snapshot.short_id()
            ),
            None => log_event!(
                ctx,
                DEBUG,
                event_names::CONFIG_DEFAULT_USED,
                Stage::Init,
                "using built-in configuration"
            ),
        }

        let emitter: Arc<dyn ProgressEmitter> = if global.progress {
            Arc::new(JsonlWriter::new(std::io::stderr()))
        } else {
            Arc::new(NullEmitter)
        };

        Ok(Session {
            global,
            ctx,
            config: resolved.config,
            snapshot,
            emitter,
            deadline: Deadline::new(global.timeout),
        })
    }

    fn date_range(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
        if let Some(month) = self.global.month {
            let (first, last) = month_bounds(month)?;
            return Ok((Some(first), Some(last)));
        }
        if let (Some(from), Some(to)) = (self.global.from, self.global.to) {
            if from > to {
                return Err(Error::invalid_parameter(
                    "from",
                    from,
                    format!("must not be after --to {}", to),
                ));
            }
        }
        Ok((self.global.from, self.global.to))
    }

    fn load(&mut self) -> Result<Loaded> {
        let path = self.global.input.as_deref().ok_or_else(|| {
            Error::invalid_parameter("input", "<none>", "an input file is required (--input <path>)")
        })?;
        let (from, to) = self.date_range()?;
        let format = SourceFormat::from_path(path)?;

        self.emitter.emit(
            ProgressEvent::new(progress_names::INGEST_STARTED, Phase::Ingest)
                .with_detail("path", path.display().to_string()),
        );
        let raw = read_source(path, self.config.ingest.delimiter)?;
        log_event!(
            self.ctx,
            INFO,
            event_names::INGEST_FINISHED,
            Stage::Ingest,
            "source read",
            records = raw.len() as u64,
            format = format.to_string()
        );
        self.emitter.emit(
            ProgressEvent::new(progress_names::INGEST_COMPLETE, Phase::Ingest)
                .with_progress(raw.len() as u64, Some(raw.len() as u64)),
        );

        let report = Normalizer::new(self.config.ingest.schema.clone()).normalize_all(&raw);
        let (total, skipped) = (report.total, report.skipped_count());
        if skipped > 0 {
            log_event!(
                self.ctx,
                WARN,
                event_names::NORMALIZE_FINISHED,
                Stage::Normalize,
                format!("{} of {} records skipped", skipped, total),
                skipped = skipped as u64,
                total = total as u64
            );
        }
        self.emitter.emit(
            ProgressEvent::new(progress_names::NORMALIZE_COMPLETE, Phase::Normalize)
                .with_progress((total - skipped) as u64, Some(total as u64))
                .with_detail("skipped", skipped),
        );

        let records: Vec<NormalizedRecord> = report
            .records
            .into_iter()
            .filter(|r| within_dates(&r.interval.start, from, to))
            .collect();
        let dataset = Arc::new(Dataset::new(
            records.iter().map(|r| r.interval.clone()).collect(),
        ));

        let analysis_id = AnalysisId::new();
        self.ctx = self.ctx.clone().with_analysis_id(analysis_id.to_string());
        self.emitter = Arc::new(AnalysisEmitter::new(
            analysis_id.to_string(),
            Arc::clone(&self.emitter),
        ));
        if dataset.is_empty() {
            log_event!(
                self.ctx,
                WARN,
                event_names::NORMALIZE_FINISHED,
                Stage::Normalize,
                "no sessions in the selected range"
            );
        }

        let input = InputSummary {
            path: path.display().to_string(),
            format: format.to_string(),
            records: total,
            skipped,
            intervals: dataset.len(),
            from,
            to,
            fingerprint: dataset.fingerprint().to_string(),
        };
        Ok(Loaded {
            analysis_id,
            dataset,
            records,
            input,
        })
    }

    fn runner(&self) -> AnalysisRunner {
        AnalysisRunner::new(self.config.engine.slice_len).with_emitter(Arc::clone(&self.emitter))
    }

    fn analyze(
        &self,
        runner: &AnalysisRunner,
        loaded: &Loaded,
        request: AnalysisRequest,
    ) -> Result<AnalysisOutput> {
        log_event!(
            self.ctx,
            DEBUG,
            event_names::ANALYZE_STARTED,
            Stage::Analyze,
            "analysis started",
            analysis = request.name()
        );
        let started = Instant::now();
        let output = runner
            .run(Arc::clone(&loaded.dataset), request, self.deadline.remaining())
            .map_err(|err| match err {
                Error::Timeout { .. } => Error::Timeout {
                    seconds: self.deadline.seconds(),
                },
                other => other,
            });
        match &output {
            Ok(_) => log_event!(
                self.ctx,
                INFO,
                event_names::ANALYZE_FINISHED,
                Stage::Analyze,
                "analysis finished",
                analysis = request.name(),
                elapsed_ms = started.elapsed().as_millis() as u64
            ),
            Err(err) => log_event!(
                self.ctx,
                WARN,
                event_names::ANALYZE_CANCELLED,
                Stage::Analyze,
                "analysis did not complete",
                analysis = request.name(),
                error = err.to_string()
            ),
        }
        output
    }

    fn emit<T: Serialize + Render>(
        &self,
        loaded: &Loaded,
        command: &'static str,
        report: &T,
    ) -> Result<ExitCode> {
        let envelope = Envelope::new(
            command,
            &loaded.analysis_id,
            &loaded.input,
            self.snapshot.short_id(),
            report,
        );
        if let Some(text) = render(self.global.format, &envelope)? {
            println!("{}", text);
        }
        Ok(if loaded.dataset.is_empty() {
            ExitCode::NoData
        } else {
            ExitCode::Clean
        })
    }

    fn units_per_token(&self, flag: Option<u32>) -> u32 {
        flag.unwrap_or(self.config.resource.units_per_resource)
    }

    fn stats(&self, runner: &AnalysisRunner, loaded: &Loaded) -> Result<StatsReport> {
        let stats = self
            .analyze(runner, loaded, AnalysisRequest::Stats)?
            .into_stats()?;
        let resource = &self.config.resource;
        let model = ResourceModel::new(resource.units_per_resource)?;
        let policy = CapacityPolicy {
            tokens_available: resource.tokens_available,
            units_per_resource: resource.units_per_resource,
            buy_above_pct: self.config.thresholds.buy_above_pct,
            reduce_below_pct: self.config.thresholds.reduce_below_pct,
        };
        Ok(StatsReport {
            stats,
            units_per_resource: resource.units_per_resource,
            peak_tokens: model.units_for(stats.worst_case),
            average_tokens: model.units_for(stats.average_case),
            recommendation: policy.evaluate(stats.worst_case)?,
        })
    }

    fn histogram(
        &self,
        runner: &AnalysisRunner,
        loaded: &Loaded,
        args: &HistogramArgs,
    ) -> Result<HistogramReport> {
        let bin_size = args.bin_size.unwrap_or(self.config.histogram.bin_size);
        let units_per_resource = self.units_per_token(args.units_per_token);
        let buckets = self
            .analyze(
                runner,
                loaded,
                AnalysisRequest::Histogram {
                    bin_size,
                    units_per_resource,
                },
            )?
            .into_histogram()?;
        Ok(HistogramReport {
            bin_size,
            units_per_resource,
            buckets,
        })
    }

    fn periods(
        &self,
        runner: &AnalysisRunner,
        loaded: &Loaded,
        args: &PeriodsArgs,
    ) -> Result<PeriodsReport> {
        let threshold = args
            .threshold
            .unwrap_or(self.config.thresholds.peak_threshold);
        let units_per_resource = self.units_per_token(args.units_per_token);
        let periods = self
            .analyze(
                runner,
                loaded,
                AnalysisRequest::Periods {
                    threshold,
                    units_per_resource,
                },
            )?
            .into_periods()?;
        Ok(PeriodsReport {
            threshold,
            units_per_resource,
            total_seconds: periods.iter().map(|p| p.duration_seconds).sum(),
            periods,
        })
    }

    fn occurrences(
        &self,
        runner: &AnalysisRunner,
        loaded: &Loaded,
        args: &OccurrencesArgs,
    ) -> Result<OccurrencesReport> {
        let threshold = args.threshold.unwrap_or_else(|| {
            u64::try_from(self.config.thresholds.peak_threshold).unwrap_or(0)
        });
        let units_per_resource = self.units_per_token(args.units_per_token);
        let occurrences = self
            .analyze(
                runner,
                loaded,
                AnalysisRequest::Occurrences {
                    threshold,
                    units_per_resource,
                },
            )?
            .into_occurrences()?;
        Ok(OccurrencesReport {
            threshold,
            units_per_resource,
            occurrences,
        })
    }

    fn usage(&self, loaded: &Loaded, args: &UsageArgs) -> Result<UsageReport> {
        let limit = args.limit.unwrap_or(self.config.ranking.top_n);
        if limit == 0 {
            return Err(Error::invalid_parameter("limit", limit, "must be positive"));
        }
        let by = EntityKind::from(args.by);
        let groups = group_by_entity(loaded.dataset.intervals(), by);
        let usage = aggregate_non_overlapping(&groups, args.tag);
        let by_active_time = rank_by_active_time(&usage, limit)
            .iter()
            .filter_map(|ranked| usage.get(&ranked.entity).cloned())
            .collect();
        let by_reported_duration = match by {
            EntityKind::User => rank_by_reported_duration(&loaded.records, limit),
            _ => Vec::new(),
        };
        Ok(UsageReport {
            by,
            tag: args.tag,
            limit,
            by_active_time,
            by_reported_duration,
        })
    }

    fn calendar(&self, loaded: &Loaded, grouping: HeatmapGrouping) -> CalendarReport {
        let intervals = loaded.dataset.intervals();
        CalendarReport {
            months: available_months(intervals),
            daily_volume: daily_volume(intervals),
            heatmap_grouping: grouping,
            heatmap: login_heatmap(intervals, grouping),
        }
    }
}

fn run_analysis(global: &GlobalOpts, ctx: LogContext, command: &Commands) -> Result<ExitCode> {
    let mut session = Session::open(global, ctx)?;
    let loaded = session.load()?;
    let runner = session.runner();

    match command {
        Commands::Stats => {
            let report = session.stats(&runner, &loaded)?;
            session.emit(&loaded, "stats", &report)
        }
        Commands::Histogram(args) => {
            let report = session.histogram(&runner, &loaded, args)?;
            session.emit(&loaded, "histogram", &report)
        }
        Commands::Periods(args) => {
            let report = session.periods(&runner, &loaded, args)?;
            session.emit(&loaded, "periods", &report)
        }
        Commands::Occurrences(args) => {
            let report = session.occurrences(&runner, &loaded, args)?;
            session.emit(&loaded, "occurrences", &report)
        }
        Commands::Usage(args) => {
            let report = session.usage(&loaded, args)?;
            session.emit(&loaded, "usage", &report)
        }
        Commands::Calendar(args) => {
            let report = session.calendar(&loaded, args.heatmap.into());
            session.emit(&loaded, "calendar", &report)
        }
        Commands::Report => {
            let report = FullReport {
                stats: session.stats(&runner, &loaded)?,
                histogram: session.histogram(
                    &runner,
                    &loaded,
                    &HistogramArgs {
                        bin_size: None,
                        units_per_token: None,
                    },
                )?,
                periods: session.periods(
                    &runner,
                    &loaded,
                    &PeriodsArgs {
                        threshold: None,
                        units_per_token: None,
                    },
                )?,
                usage: session.usage(
                    &loaded,
                    &UsageArgs {
                        by: EntityArg::User,
                        tag: None,
                        limit: None,
                    },
                )?,
                calendar: session.calendar(&loaded, HeatmapGrouping::Weekday),
            };
            session.emit(&loaded, "report", &report)
        }
        Commands::Config(_) | Commands::Version => Err(Error::Internal(format!(
            "{} is not an analysis command",
            command.name()
        ))),
    }
}

// ============================================================================
// Configuration commands
// ============================================================================

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> Result<ExitCode> {
    match &args.command {
        ConfigCommands::Show { schema: true } => {
            let schema = serde_json::to_string_pretty(&AnalysisConfig::json_schema())?;
            match global.format {
                OutputFormat::Md => println!("```json\n{}\n```", schema),
                OutputFormat::Exitcode => {}
                _ => println!("{}", schema),
            }
            Ok(ExitCode::Clean)
        }
        ConfigCommands::Show { schema: false } => {
            let resolved = load_config(global.config.as_deref())?;
            print_config(global, &resolved, "show")
        }
        ConfigCommands::Validate { path } => {
            let path = path.as_deref().or(global.config.as_deref());
            let resolved = load_config(path)?;
            print_config(global, &resolved, "validate")
        }
    }
}

fn print_config(global: &GlobalOpts, resolved: &ResolvedConfig, action: &str) -> Result<ExitCode> {
    let snapshot = resolved.snapshot();
    let path = resolved
        .paths
        .analysis
        .as_ref()
        .map(|p| p.display().to_string());

    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "valid",
                "source": resolved.paths.source.to_string(),
                "path": path,
                "using_defaults": path.is_none(),
                "config_hash": snapshot.config_hash,
                "config": resolved.config,
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Summary => {
            println!(
                "[{}] config {}: OK ({})",
                snapshot.short_id(),
                action,
                path.as_deref().unwrap_or("built-in defaults")
            );
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            let summary = &snapshot.summary;
            println!("# Configuration\n");
            println!("Status: ✓ Valid");
            println!(
                "Source: {} ({})\n",
                resolved.paths.source,
                path.as_deref().unwrap_or("built-in defaults")
            );
            println!("| Setting | Value |\n| --- | --- |");
            println!("| Users per token | {} |", summary.units_per_resource);
            println!("| Tokens available | {} |", summary.tokens_available);
            println!("| Histogram bin size | {} |", summary.bin_size);
            println!("| Peak threshold | {} |", summary.peak_threshold);
            println!("| Buy above | {}% |", summary.buy_above_pct);
            println!("| Reduce below | {}% |", summary.reduce_below_pct);
        }
    }
    Ok(ExitCode::Clean)
}

fn print_version(global: &GlobalOpts) -> Result<ExitCode> {
    let version = env!("CARGO_PKG_VERSION");
    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": version,
                "schema_version": SCHEMA_VERSION,
                "config_schema_version": tc_config::CONFIG_SCHEMA_VERSION,
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Exitcode => {}
        _ => println!("tc-core {}", version),
    }
    Ok(ExitCode::Clean)
}
