//! Cycle Sync CLI
//!
//! Analyzes cycle-timer timestamp logs of multi-camera recordings and
//! writes per-recording synchrony reports.

use clap::{Parser, Subcommand};
use cycle_sync::{
    config::{ConfigError, FileConfig},
    loader::{CameraSource, RecordingSource, SchemaKind},
    metrics::MetricsRegistry,
    pipeline::Pipeline,
    report::{write_decoded, ReportError, ReportWriter},
    timestamp::{CameraSeries, MalformedPolicy},
    Error, Result, SynchronyReport,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "cycle-sync", author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze recordings and write synchrony reports
    Analyze(AnalyzeArgs),
    /// Print the decoded timestamps of one log as CSV
    Decode(DecodeArgs),
}

#[derive(clap::Args, Debug)]
struct AnalyzeArgs {
    /// TOML configuration file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Ad-hoc recording: a name followed by one log file per camera
    #[arg(long, num_args = 2.., value_names = ["NAME", "FILE"])]
    recording: Option<Vec<String>>,

    /// Output directory for report tables
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Drop threshold as a multiple of the running median interval
    #[arg(long)]
    threshold: Option<f64>,

    /// Number of previous intervals in the running median
    #[arg(long)]
    window: Option<usize>,

    /// Abort a camera's series on the first malformed timestamp
    #[arg(long)]
    abort_on_malformed: bool,

    /// Also write metrics.prom into the output directory
    #[arg(long)]
    metrics: bool,
}

#[derive(clap::Args, Debug)]
struct DecodeArgs {
    /// Timestamp log file
    file: PathBuf,

    /// Log schema (detected from the header when omitted)
    #[arg(long, value_enum)]
    schema: Option<SchemaKind>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Analyze(args) => analyze(args),
        Commands::Decode(args) => decode(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn analyze(args: AnalyzeArgs) -> Result<()> {
    info!("Cycle Sync v{}", cycle_sync::VERSION);

    let mut config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    // Command line flags override the file
    if let Some(threshold) = args.threshold {
        config.drops.threshold_multiple = threshold;
    }
    if let Some(window) = args.window {
        config.drops.window = Some(window);
    }
    if args.abort_on_malformed {
        config.decode.on_malformed = MalformedPolicy::Abort;
    }
    if let Some(output) = args.output {
        config.output.directory = output;
    }
    if args.metrics {
        config.output.metrics = true;
    }
    if let Some(values) = &args.recording {
        if let Some((name, files)) = values.split_first() {
            let recording = files
                .iter()
                .fold(RecordingSource::new(name.as_str()), |recording, file| {
                    recording.with_camera(CameraSource::new(file))
                });
            config.recordings.push(recording);
        }
    }

    config.validate()?;
    if config.recordings.is_empty() {
        return Err(ConfigError::NoRecordings.into());
    }

    let pipeline = Pipeline::new(config.analysis());
    let outcome = pipeline.analyze_batch(&config.recordings);

    let writer = ReportWriter::new(&config.output.directory);
    let write_failures = writer.write_all(outcome.reports()).len();

    let metrics = MetricsRegistry::new()?;
    for (_, result) in &outcome.results {
        match result {
            Ok(report) => {
                metrics.observe(report);
                print_summary(report);
            }
            Err(_) => metrics.record_failure(),
        }
    }

    if config.output.metrics {
        let path = config.output.directory.join("metrics.prom");
        metrics.write_to(&path)?;
        info!(path = %path.display(), "Wrote metrics");
    }

    let batch = outcome.check();
    if write_failures > 0 {
        let failed = Error::ReportsFailed {
            failed: write_failures,
            total: outcome.reports().count(),
        };
        if let Err(e) = &batch {
            error!("{}", e);
        }
        return Err(failed);
    }
    batch
}

fn decode(args: DecodeArgs) -> Result<()> {
    let mut source = CameraSource::new(&args.file);
    if let Some(schema) = args.schema {
        source = source.with_schema(schema);
    }

    let log = source.load()?;
    let series = CameraSeries::decode(&log.camera, log.readings(), MalformedPolicy::Skip)?;
    for condition in series.all_conditions() {
        condition.log(&series.camera);
    }

    write_decoded(&log, &series, std::io::stdout().lock()).map_err(|source| {
        Error::Report(ReportError::Csv {
            path: PathBuf::from("<stdout>"),
            source,
        })
    })
}

fn print_summary(report: &SynchronyReport) {
    println!(
        "{}: {} cameras, {} common frames, {} drops, {} conditions",
        report.recording,
        report.cameras.len(),
        report.synchrony.common_frames,
        report.total_drops(),
        report.total_conditions()
    );
    for summary in &report.synchrony.summaries {
        println!(
            "  {:<12} mean {:+.9} s  max |dev| {:.9} s  std {:.9} s",
            summary.camera, summary.mean, summary.max_abs, summary.std_dev
        );
    }
}
