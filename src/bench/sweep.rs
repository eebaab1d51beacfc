//! Running the benchmark executable over the corpus

use super::corpus::CorpusWalker;
use super::{BenchError, BenchmarkCase, SweepParams};
use crate::process::{self, ProcessSpec};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of one benchmark case
#[derive(Debug)]
pub struct CaseResult {
    pub case: BenchmarkCase,
    /// Wall-clock time of the run, or why it failed
    pub outcome: Result<Duration, BenchError>,
}

impl CaseResult {
    pub const fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Totals for a finished sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Dataset entries that were not valid cases
    pub skipped: usize,
    /// Summed run time of all cases
    pub total_time: Duration,
}

impl SweepSummary {
    /// Add one case to the totals
    pub fn record(&mut self, result: &CaseResult) {
        match &result.outcome {
            Ok(elapsed) => {
                self.succeeded += 1;
                self.total_time += *elapsed;
            }
            Err(_) => self.failed += 1,
        }
    }
}

/// Lazy sweep over a dataset
///
/// Each call to `next` runs the benchmark for one case and blocks until it
/// finishes. A failing case is reported and the sweep moves on. Dropping the
/// iterator stops the sweep; calling [`run_sweep`] again starts over.
#[derive(Debug)]
pub struct BenchmarkSweep {
    cases: CorpusWalker,
    tool: PathBuf,
    output: PathBuf,
    params: SweepParams,
    timeout: Option<Duration>,
    capture_output: bool,
}

/// Start a sweep of `dataset_root` with the benchmark at `tool`
///
/// Every case writes its encoded output to `output`, overwriting the
/// previous case's file.
pub fn run_sweep(
    dataset_root: &Path,
    tool: &Path,
    output: &Path,
    params: SweepParams,
) -> Result<BenchmarkSweep, BenchError> {
    if !dataset_root.is_dir() {
        return Err(BenchError::DatasetNotFound(dataset_root.to_path_buf()));
    }

    crate::debug!(
        "sweeping {} with {}",
        dataset_root.display(),
        tool.display()
    );

    Ok(BenchmarkSweep {
        cases: CorpusWalker::new(dataset_root),
        tool: tool.to_path_buf(),
        output: output.to_path_buf(),
        params,
        timeout: None,
        capture_output: false,
    })
}

impl BenchmarkSweep {
    /// Kill a case that runs longer than `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Capture the benchmark's output instead of passing it through
    #[must_use]
    pub fn capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    /// Dataset entries skipped so far
    pub fn skipped(&self) -> &[BenchError] {
        self.cases.skipped()
    }

    /// Command line for one case
    pub fn case_spec(&self, case: &BenchmarkCase) -> ProcessSpec {
        let resolution = case.resolution.to_string();
        let spec = ProcessSpec::new(&self.tool)
            .arg("-d")
            .args([&resolution, &resolution, &resolution])
            .arg("-f")
            .arg(self.params.framerate.to_string())
            .arg("-g")
            .arg(self.params.gop_size.to_string())
            .arg("-b")
            .arg(self.params.max_brickgroup_size.to_string())
            .arg("-m")
            .arg(self.params.motion_vectors_flag())
            .arg("-i")
            .arg(&case.dir)
            .arg("-o")
            .arg(&self.output)
            .timeout(self.timeout);

        if self.capture_output {
            spec
        } else {
            spec.inherit_output()
        }
    }

    fn run_case(&self, case: &BenchmarkCase) -> Result<Duration, BenchError> {
        let failed = |reason: String| BenchError::BenchmarkCaseFailed {
            dir: case.dir.clone(),
            reason,
        };

        let output = process::run(&self.case_spec(case)).map_err(|e| failed(e.to_string()))?;
        if !output.success() {
            return Err(failed(format!("exited with code {}", output.code_display())));
        }
        Ok(output.duration)
    }
}

impl Iterator for BenchmarkSweep {
    type Item = CaseResult;

    fn next(&mut self) -> Option<Self::Item> {
        let case = self.cases.next()?;
        crate::debug!("benchmarking {case} in {}", case.dir.display());

        let outcome = self.run_case(&case);
        if let Err(e) = &outcome {
            crate::warning!("{e}");
        }

        Some(CaseResult { case, outcome })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests can panic")]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_dataset_is_fatal() {
        let temp = TempDir::new().unwrap();
        let err = run_sweep(
            &temp.path().join("dataset"),
            Path::new("./splv_benchmark"),
            Path::new("temp.splv"),
            SweepParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BenchError::DatasetNotFound(_)));
    }

    #[test]
    fn case_arguments() {
        let temp = TempDir::new().unwrap();
        let params = SweepParams {
            motion_vectors: false,
            ..SweepParams::default()
        };
        let sweep = run_sweep(
            temp.path(),
            Path::new("./splv_benchmark"),
            Path::new("temp.splv"),
            params,
        )
        .unwrap();
        let case = BenchmarkCase {
            content: "dancer".to_string(),
            resolution: 128,
            dir: PathBuf::from("dataset/dancer/128"),
        };

        let args: Vec<String> = sweep
            .case_spec(&case)
            .arguments()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            vec![
                "-d",
                "128",
                "128",
                "128",
                "-f",
                "30",
                "-g",
                "10",
                "-b",
                "512",
                "-m",
                "off",
                "-i",
                "dataset/dancer/128",
                "-o",
                "temp.splv",
            ]
        );
    }

    #[test]
    fn launch_failure_does_not_stop_sweep() {
        let temp = TempDir::new().unwrap();
        for dir in ["a/16", "a/32", "b/16"] {
            fs::create_dir_all(temp.path().join(dir)).unwrap();
        }

        let results: Vec<CaseResult> = run_sweep(
            temp.path(),
            &temp.path().join("no_such_benchmark"),
            &temp.path().join("out.splv"),
            SweepParams::default(),
        )
        .unwrap()
        .capture_output(true)
        .collect();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| matches!(
            r.outcome,
            Err(BenchError::BenchmarkCaseFailed { .. })
        )));

        let mut summary = SweepSummary::default();
        for result in &results {
            summary.record(result);
        }
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.succeeded, 0);
    }
}
