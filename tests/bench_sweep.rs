mod common;

use common::helpers::create_dataset;
use splvkit::bench::{BenchError, SweepParams, run_sweep};
use tempfile::TempDir;

#[test]
fn invalid_resolution_directory_is_skipped() {
    let temp = TempDir::new().unwrap();
    let root = create_dataset(&temp, &["content1/128", "content1/abc"]);

    let mut sweep = run_sweep(
        &root,
        &temp.path().join("no_benchmark_here"),
        &temp.path().join("temp.splv"),
        SweepParams::default(),
    )
    .unwrap()
    .capture_output(true);

    let results: Vec<_> = sweep.by_ref().collect();

    assert_eq!(results.len(), 1);
    assert_eq!(results.first().map(|r| r.case.resolution), Some(128));
    assert_eq!(sweep.skipped().len(), 1);
}

#[test]
fn missing_dataset_root_is_reported() {
    let temp = TempDir::new().unwrap();
    let err = run_sweep(
        &temp.path().join("dataset"),
        &temp.path().join("splv_benchmark"),
        &temp.path().join("temp.splv"),
        SweepParams::default(),
    )
    .unwrap_err();

    assert!(matches!(err, BenchError::DatasetNotFound(_)));
    assert!(err.to_string().contains("dataset"));
}

#[test]
fn sweep_restarts_from_the_beginning() {
    let temp = TempDir::new().unwrap();
    let root = create_dataset(&temp, &["a/8", "b/8"]);
    let tool = temp.path().join("missing_tool");
    let output = temp.path().join("temp.splv");

    let first: Vec<String> = run_sweep(&root, &tool, &output, SweepParams::default())
        .unwrap()
        .capture_output(true)
        .map(|r| r.case.content)
        .collect();
    let second: Vec<String> = run_sweep(&root, &tool, &output, SweepParams::default())
        .unwrap()
        .capture_output(true)
        .map(|r| r.case.content)
        .collect();

    assert_eq!(first, vec!["a", "b"]);
    assert_eq!(first, second);
}

#[cfg(unix)]
mod with_fake_benchmark {
    use super::*;
    use crate::common::helpers::{bench_log, fake_benchmark};
    use splvkit::bench::SweepSummary;

    #[test]
    fn every_case_runs_in_sorted_order() {
        let temp = TempDir::new().unwrap();
        let root = create_dataset(&temp, &["smoke/64", "dancer/256", "dancer/128"]);
        let tool = fake_benchmark(temp.path(), &[]);

        let mut summary = SweepSummary::default();
        for result in run_sweep(
            &root,
            &tool,
            &temp.path().join("temp.splv"),
            SweepParams::default(),
        )
        .unwrap()
        .capture_output(true)
        {
            summary.record(&result);
        }

        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 0);
        let inputs = bench_log(temp.path());
        assert_eq!(inputs.len(), 3);
        assert!(inputs.first().unwrap().ends_with("dancer/128"));
        assert!(inputs.get(1).unwrap().ends_with("dancer/256"));
        assert!(inputs.last().unwrap().ends_with("smoke/64"));
    }

    #[test]
    fn nonzero_exit_fails_only_that_case() {
        let temp = TempDir::new().unwrap();
        let root = create_dataset(&temp, &["a/16", "a/32", "b/16"]);
        let tool = fake_benchmark(temp.path(), &["a/16"]);

        let results: Vec<_> = run_sweep(
            &root,
            &tool,
            &temp.path().join("temp.splv"),
            SweepParams::default(),
        )
        .unwrap()
        .capture_output(true)
        .collect();

        assert_eq!(results.len(), 3);
        let failed: Vec<_> = results.iter().filter(|r| !r.succeeded()).collect();
        assert_eq!(failed.len(), 1);
        assert!(matches!(
            failed.first().map(|r| &r.outcome),
            Some(Err(BenchError::BenchmarkCaseFailed { dir, .. })) if dir.ends_with("a/16")
        ));
        assert_eq!(bench_log(temp.path()).len(), 3);
    }
}
