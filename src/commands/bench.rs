//! Bench command
//!
//! Run the benchmark executable over every case in the dataset

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use splvkit::Config;
use splvkit::bench::{self, SweepParams, SweepSummary};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Options for `splvkit bench`
#[derive(Debug, Default)]
pub(crate) struct BenchOptions {
    pub(crate) dataset: Option<PathBuf>,
    pub(crate) tool: Option<PathBuf>,
    pub(crate) output: Option<PathBuf>,
    pub(crate) framerate: Option<u32>,
    pub(crate) gop_size: Option<u32>,
    pub(crate) max_brickgroup_size: Option<u32>,
    pub(crate) motion_vectors: Option<bool>,
    pub(crate) timeout: Option<u64>,
    pub(crate) quiet: bool,
    pub(crate) strict: bool,
}

/// Parse `on`/`off` for the `-m` flag
pub(crate) fn parse_on_off(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected 'on' or 'off', got '{other}'")),
    }
}

/// Sweep the dataset with one parameter set
///
/// Failing cases are reported and counted; the command only fails for a
/// missing dataset, or with `--strict` when any case failed.
pub(crate) fn run(options: &BenchOptions, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load_with_options(config_path).context("Failed to load configuration")?;

    let dataset = options
        .dataset
        .clone()
        .unwrap_or_else(|| config.dataset_dir());
    let tool = options.tool.clone().unwrap_or_else(|| config.bench_tool());
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| config.bench_output());
    let params = merge_params(config.sweep_params(), options);
    let timeout = match options.timeout {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => config.bench_timeout(),
    };

    if !tool.exists() {
        splvkit::warning!(
            "benchmark executable {} not found; every case will fail",
            tool.display()
        );
    }

    let mut sweep = bench::run_sweep(&dataset, &tool, &output, params)
        .context("Cannot run benchmark sweep")?
        .with_timeout(timeout)
        .capture_output(options.quiet);

    println!(
        "Benchmarking {} (fps {}, gop {}, max brick group {}, motion vectors {})",
        dataset.display(),
        params.framerate,
        params.gop_size,
        params.max_brickgroup_size,
        params.motion_vectors_flag()
    );

    let progress = options.quiet.then(|| {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} cases {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    });

    let mut summary = SweepSummary::default();
    for result in sweep.by_ref() {
        summary.record(&result);
        match &progress {
            Some(pb) => {
                pb.inc(1);
                pb.set_message(result.case.to_string());
            }
            None => match &result.outcome {
                Ok(elapsed) => {
                    println!("  OK {} ({:.1}s)", result.case, elapsed.as_secs_f64());
                }
                Err(_) => println!("  FAIL {}", result.case),
            },
        }
    }
    summary.skipped = sweep.skipped().len();

    if let Some(pb) = progress {
        pb.finish_with_message("done");
    }

    println!();
    println!(
        "{} cases: {} succeeded, {} failed, {} skipped ({:.1}s)",
        summary.succeeded + summary.failed,
        summary.succeeded,
        summary.failed,
        summary.skipped,
        summary.total_time.as_secs_f64()
    );

    if options.strict && summary.failed > 0 {
        bail!("{} benchmark cases failed", summary.failed);
    }
    Ok(())
}

fn merge_params(from_config: SweepParams, options: &BenchOptions) -> SweepParams {
    SweepParams {
        framerate: options.framerate.unwrap_or(from_config.framerate),
        gop_size: options.gop_size.unwrap_or(from_config.gop_size),
        max_brickgroup_size: options
            .max_brickgroup_size
            .unwrap_or(from_config.max_brickgroup_size),
        motion_vectors: options.motion_vectors.unwrap_or(from_config.motion_vectors),
    }
}
