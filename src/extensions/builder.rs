//! Extension Builder Orchestration
//!
//! Runs the whole pipeline for one target:
//! plan layout -> configure -> build -> resolve artifact -> stage package.
//! Candidate files left in the output directory by an earlier build are
//! removed right before the build step.
//! Any failure aborts the pipeline before staging, so a package directory is
//! only ever written from a build that resolved exactly one artifact.

use super::error::BuildError;
use super::layout::OutputLayout;
use super::resolver::{clear_stale_candidates, resolve_artifact};
use super::stager;
use super::toolchain::CMakeToolchain;
use super::types::{
    BuildConfiguration, BuildResult, BuildStage, ExtensionTarget, ResolvedArtifact, StagedPackage,
};
use crate::process::ProcessSpec;
use std::path::Path;
use std::time::{Duration, Instant};

/// Everything a build would do, without doing it
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Output directory and candidate names
    pub layout: OutputLayout,
    /// Configure step
    pub configure: ProcessSpec,
    /// Build step
    pub build: ProcessSpec,
}

/// Outcome of a successful [`ExtensionBuilder::build_and_stage`]
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub target_name: String,
    /// Artifact in the build output directory
    pub artifact: ResolvedArtifact,
    /// What was written into the package directory
    pub staged: StagedPackage,
    /// Stages the pipeline passed through, in order
    pub stages: Vec<BuildStage>,
    /// Configure and build output (stdout + stderr)
    pub output: String,
    pub duration: Duration,
}

/// Stage trail, collected output and outcome of one pipeline run
struct Attempt {
    stages: Vec<BuildStage>,
    output: String,
    outcome: Result<(ResolvedArtifact, StagedPackage), BuildError>,
}

/// Extension builder coordinator
///
/// The toolchain is located once, when the builder is created; every build
/// afterwards reuses it.
#[derive(Debug)]
pub struct ExtensionBuilder {
    toolchain: CMakeToolchain,
    /// Echo toolchain output after each step
    verbose: bool,
}

impl ExtensionBuilder {
    /// Create a builder around an already located toolchain
    #[must_use]
    pub const fn new(toolchain: CMakeToolchain, verbose: bool) -> Self {
        Self { toolchain, verbose }
    }

    pub const fn toolchain(&self) -> &CMakeToolchain {
        &self.toolchain
    }

    /// Layout and command lines for building `target`
    pub fn plan(&self, target: &ExtensionTarget, config: &BuildConfiguration) -> BuildPlan {
        let (target, config) = anchored(target, config);
        let (target, config) = (&target, &config);
        let layout = OutputLayout::plan(target, config);
        let configure = self.toolchain.configure_spec(target, config, &layout);
        let build = self
            .toolchain
            .build_spec(&config.build_dir_for(target), config);
        BuildPlan {
            layout,
            configure,
            build,
        }
    }

    /// Build `target` and stage its artifact into the package directory
    ///
    /// Not resumable: calling again re-runs from configure, reusing the
    /// existing build directory.
    pub fn build_and_stage(
        &self,
        target: &ExtensionTarget,
        config: &BuildConfiguration,
    ) -> Result<BuildReport, BuildError> {
        let start = Instant::now();
        let attempt = self.attempt(target, config);
        let (artifact, staged) = attempt.outcome?;

        Ok(BuildReport {
            target_name: target.name.clone(),
            artifact,
            staged,
            stages: attempt.stages,
            output: attempt.output,
            duration: start.elapsed(),
        })
    }

    /// Run the pipeline, keeping the stage trail whatever the outcome
    fn attempt(&self, target: &ExtensionTarget, config: &BuildConfiguration) -> Attempt {
        let mut stages = vec![BuildStage::Unconfigured];
        let mut output = String::new();

        let outcome = self.run_pipeline(target, config, &mut stages, &mut output);
        if let Err(e) = &outcome {
            crate::debug!("{}: failed while {}: {e}", target.name, e.stage());
            stages.push(BuildStage::Failed);
        }

        Attempt {
            stages,
            output,
            outcome,
        }
    }

    fn run_pipeline(
        &self,
        target: &ExtensionTarget,
        config: &BuildConfiguration,
        stages: &mut Vec<BuildStage>,
        output: &mut String,
    ) -> Result<(ResolvedArtifact, StagedPackage), BuildError> {
        let (target, config) = anchored(target, config);
        let (target, config) = (&target, &config);
        let mut enter = |stage: BuildStage| {
            crate::debug!("{}: {stage}", target.name);
            stages.push(stage);
        };

        config.validate()?;
        let layout = OutputLayout::plan(target, config);
        let build_dir = config.build_dir_for(target);

        enter(BuildStage::Configuring);
        let configured = self.toolchain.configure(target, config, &layout)?;
        self.echo(&configured.combined());
        output.push_str(&configured.combined());
        enter(BuildStage::Configured);

        enter(BuildStage::Building);
        clear_stale_candidates(&layout)?;
        let built = self.toolchain.build(&build_dir, config)?;
        self.echo(&built.combined());
        output.push_str(&built.combined());
        enter(BuildStage::Built);

        enter(BuildStage::Resolving);
        let artifact = resolve_artifact(&layout)?;
        enter(BuildStage::Resolved);

        let reserved: Vec<&str> = layout
            .candidates()
            .iter()
            .map(|c| c.file_name.as_str())
            .collect();
        let staged = stager::stage(
            &artifact,
            &target.destination,
            target.aux_bin_dir.as_deref(),
            &reserved,
        )?;
        enter(BuildStage::Staged);

        Ok((artifact, staged))
    }

    fn echo(&self, text: &str) {
        if self.verbose && !text.is_empty() {
            print!("{text}");
        }
    }

    /// Build each target in order
    ///
    /// A failing target is recorded and the remaining targets still build.
    #[must_use]
    pub fn build_many(
        &self,
        targets: &[ExtensionTarget],
        config: &BuildConfiguration,
    ) -> Vec<BuildResult> {
        targets
            .iter()
            .map(|target| {
                let start = Instant::now();
                let attempt = self.attempt(target, config);
                let duration = start.elapsed();
                let result = match attempt.outcome {
                    Ok((_, staged)) => BuildResult::success(
                        target.name.clone(),
                        duration,
                        staged.artifact,
                        attempt.output,
                    ),
                    Err(e) => {
                        let mut output = attempt.output;
                        output.push_str(e.toolchain_output().unwrap_or_default());
                        BuildResult::failure(target.name.clone(), duration, e.to_string(), output)
                    }
                };
                result.with_stages(attempt.stages)
            })
            .collect()
    }

    /// Get summary statistics
    ///
    /// # Returns
    /// (`successful_count`, `failed_count`, `total_duration`)
    #[must_use]
    pub fn summarize(results: &[BuildResult]) -> (usize, usize, Duration) {
        let successful = results.iter().filter(|r| r.success).count();
        let failed = results.len() - successful;
        let total_duration = results.iter().map(|r| r.duration).sum();

        (successful, failed, total_duration)
    }
}

/// Copies of `target` and `config` with every path made absolute
///
/// Configure runs from inside the build directory, so a relative source or
/// output path would otherwise be resolved against the wrong directory.
fn anchored(
    target: &ExtensionTarget,
    config: &BuildConfiguration,
) -> (ExtensionTarget, BuildConfiguration) {
    let absolute = |path: &Path| std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut target = target.clone();
    target.source_dir = absolute(&target.source_dir);
    target.destination = absolute(&target.destination);
    target.aux_bin_dir = target.aux_bin_dir.as_deref().map(absolute);

    let mut config = config.clone();
    config.build_dir = config.build_dir.as_deref().map(absolute);

    (target, config)
}

/// Build a list of targets for the host platform (convenience function)
///
/// Locates `CMake` the usual way (`CMAKE`, then `PATH`) and builds every
/// target with the default release configuration.
///
/// # Example
///
/// ```no_run
/// use splvkit::extensions::{build_extensions, ExtensionTarget};
///
/// let targets = vec![ExtensionTarget::new(
///     "splv_encoder_py",
///     "native",
///     "python/splv_encoder",
/// )];
///
/// for result in build_extensions(&targets, false)? {
///     if result.success {
///         println!("built {} in {:?}", result.target_name, result.duration);
///     } else {
///         eprintln!("failed to build {}: {:?}", result.target_name, result.error);
///     }
/// }
/// # Ok::<(), splvkit::extensions::BuildError>(())
/// ```
pub fn build_extensions(
    targets: &[ExtensionTarget],
    verbose: bool,
) -> Result<Vec<BuildResult>, BuildError> {
    let builder = ExtensionBuilder::new(CMakeToolchain::locate(None)?, verbose);
    Ok(builder.build_many(targets, &BuildConfiguration::for_host()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests can panic")]
mod tests {
    use super::*;
    use crate::platform::HostPlatform;
    use std::path::PathBuf;

    fn builder() -> ExtensionBuilder {
        ExtensionBuilder::new(CMakeToolchain::with_path("/opt/cmake/bin/cmake"), false)
    }

    #[test]
    fn plan_does_not_touch_the_filesystem() {
        let target = ExtensionTarget::new("ext", "/definitely/not/here", "/pkg");
        let config = BuildConfiguration::release(HostPlatform::Unix);

        let plan = builder().plan(&target, &config);

        assert_eq!(
            plan.layout.output_dir(),
            Path::new("/definitely/not/here/build/out")
        );
        assert!(!Path::new("/definitely/not/here").exists());
        assert_eq!(plan.configure.program(), Path::new("/opt/cmake/bin/cmake"));
        assert!(plan.build.command_line().contains("--config Release"));
    }

    #[test]
    fn invalid_configuration_stops_before_configure() {
        let target = ExtensionTarget::new("ext", "/definitely/not/here", "/pkg");
        let config = BuildConfiguration::release(HostPlatform::Unix)
            .with_option(crate::extensions::types::BUILD_TYPE_OPTION, "Debug");

        let err = builder().build_and_stage(&target, &config).unwrap_err();

        assert!(matches!(err, BuildError::InvalidConfiguration(_)));
        assert_eq!(err.stage(), BuildStage::Unconfigured);
        assert!(!Path::new("/definitely/not/here/build").exists());
    }

    #[test]
    fn build_many_keeps_going_after_failure() {
        let config = BuildConfiguration::release(HostPlatform::Unix).with_option(
            crate::extensions::types::DEFAULT_BINDINGS_OPTION,
            "OFF",
        );
        let targets = vec![
            ExtensionTarget::new("first", "/nowhere/a", "/pkg"),
            ExtensionTarget::new("second", "/nowhere/b", "/pkg"),
        ];

        let results = builder().build_many(&targets, &config);

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| !r.success));
        let names: Vec<&str> = results.iter().map(|r| r.target_name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(
            results
                .iter()
                .all(|r| r.error.as_deref().unwrap().contains("BUILD_PYTHON_BINDINGS"))
        );
        assert!(results.iter().all(|r| {
            r.stages == vec![BuildStage::Unconfigured, BuildStage::Failed]
        }));
    }

    #[cfg(unix)]
    mod pipeline {
        use super::*;
        use crate::test_utils::fixtures::{FakeCMake, fake_cmake};
        use std::fs;
        use tempfile::TempDir;

        fn project(temp: &TempDir) -> ExtensionTarget {
            let source = temp.path().join("native");
            fs::create_dir_all(&source).unwrap();
            fs::write(source.join("CMakeLists.txt"), "project(splv)\n").unwrap();
            ExtensionTarget::new("ext", source, temp.path().join("pkg"))
        }

        #[test]
        fn builds_and_stages_through_every_stage() {
            let temp = TempDir::new().unwrap();
            let cmake = fake_cmake(temp.path(), FakeCMake::Succeeds, &["ext.so"]);
            let target = project(&temp);
            let builder = ExtensionBuilder::new(CMakeToolchain::with_path(cmake), false);

            let report = builder
                .build_and_stage(&target, &BuildConfiguration::release(HostPlatform::Unix))
                .unwrap();

            assert_eq!(report.staged.artifact, temp.path().join("pkg").join("ext.so"));
            assert!(report.staged.artifact.exists());
            assert_eq!(
                report.stages,
                vec![
                    BuildStage::Unconfigured,
                    BuildStage::Configuring,
                    BuildStage::Configured,
                    BuildStage::Building,
                    BuildStage::Built,
                    BuildStage::Resolving,
                    BuildStage::Resolved,
                    BuildStage::Staged,
                ]
            );
            assert!(report.output.contains("Configuring done"));
        }

        #[test]
        fn missing_artifact_stages_nothing() {
            let temp = TempDir::new().unwrap();
            let cmake = fake_cmake(temp.path(), FakeCMake::Succeeds, &["unrelated.so"]);
            let target = project(&temp);
            let builder = ExtensionBuilder::new(CMakeToolchain::with_path(cmake), false);

            let err = builder
                .build_and_stage(&target, &BuildConfiguration::release(HostPlatform::Unix))
                .unwrap_err();

            assert_eq!(err.stage(), BuildStage::Resolving);
            assert!(!temp.path().join("pkg").exists());
        }

        #[test]
        fn configure_failure_ends_trail_after_configuring() {
            let temp = TempDir::new().unwrap();
            let cmake = fake_cmake(temp.path(), FakeCMake::ConfigureFails, &["ext.so"]);
            let target = project(&temp);
            let builder = ExtensionBuilder::new(CMakeToolchain::with_path(cmake), false);

            let results =
                builder.build_many(&[target], &BuildConfiguration::release(HostPlatform::Unix));
            let result = results.first().unwrap();

            assert_eq!(
                result.stages,
                vec![
                    BuildStage::Unconfigured,
                    BuildStage::Configuring,
                    BuildStage::Failed,
                ]
            );
            assert!(result.output.contains("Could not find pybind11"));
            assert!(!temp.path().join("pkg").exists());
        }

        #[test]
        fn failed_build_keeps_trail_up_to_failing_stage() {
            let temp = TempDir::new().unwrap();
            let cmake = fake_cmake(temp.path(), FakeCMake::BuildFails, &[]);
            let target = project(&temp);
            let builder = ExtensionBuilder::new(CMakeToolchain::with_path(cmake), false);

            let results =
                builder.build_many(&[target], &BuildConfiguration::release(HostPlatform::Unix));
            let result = results.first().unwrap();

            assert!(!result.success);
            assert_eq!(result.final_stage(), Some(BuildStage::Failed));
            assert!(result.final_stage().unwrap().is_terminal());
            assert_eq!(
                result.stages,
                vec![
                    BuildStage::Unconfigured,
                    BuildStage::Configuring,
                    BuildStage::Configured,
                    BuildStage::Building,
                    BuildStage::Failed,
                ]
            );
            assert!(result.output.contains("Configuring done"));
        }
    }

    #[test]
    fn summarize_empty() {
        let results = vec![];
        let (successful, failed, duration) = ExtensionBuilder::summarize(&results);

        assert_eq!(successful, 0);
        assert_eq!(failed, 0);
        assert_eq!(duration, Duration::from_secs(0));
    }

    #[test]
    fn summarize_mixed() {
        let results = vec![
            BuildResult::success(
                "ext1".to_string(),
                Duration::from_secs(1),
                PathBuf::from("/pkg/ext1.so"),
                "output".to_string(),
            ),
            BuildResult::failure(
                "ext2".to_string(),
                Duration::from_secs(2),
                "error".to_string(),
                "output".to_string(),
            ),
            BuildResult::success(
                "ext3".to_string(),
                Duration::from_secs(3),
                PathBuf::from("/pkg/ext3.so"),
                "output".to_string(),
            ),
        ];

        let (successful, failed, duration) = ExtensionBuilder::summarize(&results);

        assert_eq!(successful, 2);
        assert_eq!(failed, 1);
        assert_eq!(duration, Duration::from_secs(6));
    }
}
