//! geoslim: simplify GeoJSON polygons and correct feature fields from the
//! command line.
//!
//! Two subcommands:
//!
//! - `simplify` reduces the vertex count of every Polygon/MultiPolygon,
//!   prints a reduction report, and writes the simplified document.
//! - `correct` drops feature `id`s, renames `plot_id`/`country_code`, and
//!   writes the corrected document.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin geoslim -- simplify [OPTIONS] <INPUT>
//! cargo run --release --bin geoslim -- correct [OPTIONS] <INPUT>
//! ```
//!
//! Set `RUST_LOG=debug` for per-stage logging.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use geoslim_core::SimplifyConfig;
use geoslim_core::diagnostics::{Clock, ProcessDiagnostics};
use geoslim_export::Download;

/// Simplify GeoJSON polygons and correct feature metadata.
#[derive(Parser)]
#[command(name = "geoslim", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reduce polygon vertex counts and report the reduction.
    Simplify(SimplifyArgs),
    /// Drop feature ids and rename fields to the target schema.
    Correct(CorrectArgs),
}

#[derive(Args)]
struct SimplifyArgs {
    /// Path to the input GeoJSON (Feature or FeatureCollection).
    input: PathBuf,

    /// Simplification tolerance in coordinate units (degrees).
    #[arg(long, default_value_t = SimplifyConfig::DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Accept a tolerance outside the recommended range.
    #[arg(long)]
    allow_out_of_range: bool,

    /// Where to write the simplified document.
    ///
    /// Defaults to `simplified.geojson` in the current directory.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Do not write the simplified document.
    #[arg(long, conflicts_with = "output")]
    no_output: bool,

    /// Write the simplified document on a single line instead of indented.
    #[arg(long, conflicts_with = "no_output")]
    compact: bool,

    /// Number of runs for averaging stage timings.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Print diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Full simplification config as a JSON string.
    ///
    /// When provided, `--tolerance` is ignored. The JSON must be a valid
    /// `SimplifyConfig` serialization; missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

#[derive(Args)]
struct CorrectArgs {
    /// Path to the input GeoJSON (Feature or FeatureCollection).
    input: PathBuf,

    /// Where to write the corrected document.
    ///
    /// Defaults to `corrected_geojson.geojson` in the current directory.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

/// Build a [`SimplifyConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and
/// `--tolerance` is ignored. The tolerance must be finite and, unless
/// `--allow-out-of-range` is set, within the recommended range.
fn config_from_cli(args: &SimplifyArgs) -> Result<SimplifyConfig, String> {
    let config = match args.config_json {
        Some(ref json) => serde_json::from_str(json)
            .map_err(|e| format!("Error parsing --config-json: {e}"))?,
        None => SimplifyConfig::new(args.tolerance),
    };

    config.validate().map_err(|e| e.to_string())?;

    if !args.allow_out_of_range && !config.in_offered_range() {
        return Err(format!(
            "tolerance {} is outside the recommended range {}..={} (pass --allow-out-of-range to use it anyway)",
            config.tolerance,
            SimplifyConfig::MIN_TOLERANCE,
            SimplifyConfig::MAX_TOLERANCE,
        ));
    }

    Ok(config)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Simplify(ref args) => simplify(args),
        Command::Correct(ref args) => correct(args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn simplify(args: &SimplifyArgs) -> Result<(), String> {
    let config = config_from_cli(args)?;
    let bytes = read_input(&args.input)?;

    eprintln!("Input: {} ({} bytes)", args.input.display(), bytes.len());
    eprintln!("Tolerance: {}", config.tolerance);
    eprintln!("Runs: {}", args.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(args.runs);
    let mut first_result = None;

    for run in 0..args.runs {
        if args.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, args.runs);
        }

        let (result, diagnostics) =
            geoslim_core::diagnostics::process_with_diagnostics(&bytes, &config, &StdClock)
                .map_err(|e| format!("Simplification error: {e}"))?;
        log::info!(
            "run {}: {:.3}ms",
            run + 1,
            diagnostics.total_duration.as_secs_f64() * 1000.0
        );

        if args.json {
            let json = serde_json::to_string_pretty(&diagnostics)
                .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
            println!("{json}");
        } else {
            println!("{}", diagnostics.report());
        }

        if args.runs > 1 {
            eprintln!();
        }
        if first_result.is_none() {
            first_result = Some(result);
        }
        all_diagnostics.push(diagnostics);
    }

    if args.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    // Write output from the first run only.
    if !args.no_output
        && let Some(result) = first_result
    {
        let download = if args.compact {
            Download::simplified_compact(&result)
        } else {
            Download::simplified(&result)
        }
        .map_err(|e| e.to_string())?;
        write_download(&download, args.output.as_deref())?;
    }

    Ok(())
}

fn correct(args: &CorrectArgs) -> Result<(), String> {
    let bytes = read_input(&args.input)?;
    let (document, summary) =
        geoslim_core::correct_bytes(&bytes).map_err(|e| format!("Correction error: {e}"))?;

    println!(
        "Corrected {} features: {} ids removed, {} fields renamed",
        summary.features, summary.ids_removed, summary.keys_renamed,
    );

    let download = Download::corrected(&document).map_err(|e| e.to_string())?;
    write_download(&download, args.output.as_deref())
}

fn read_input(path: &Path) -> Result<Vec<u8>, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    log::debug!("read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

fn write_download(download: &Download, output: Option<&Path>) -> Result<(), String> {
    let path = output.unwrap_or_else(|| Path::new(&download.filename));
    log::debug!("writing {} to {}", download.filename, path.display());
    std::fs::write(path, &download.contents)
        .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    eprintln!(
        "{} written to {} ({} bytes)",
        download.mime_type,
        path.display(),
        download.contents.len(),
    );
    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&ProcessDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[ProcessDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Parse", |d| d.parse.duration),
        ("Simplify", |d| d.simplify.duration),
        ("Measure", |d| d.measure.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
