//! `CMake` toolchain invocation
//!
//! Drives the two toolchain steps the build needs:
//! ```bash
//! mkdir -p build && cd build
//! cmake <source> -DCMAKE_LIBRARY_OUTPUT_DIRECTORY...=<out> -DCMAKE_BUILD_TYPE=Release ...
//! cmake --build <build> --config Release
//! ```
//! Both steps fail hard on a non-zero exit and keep the toolchain's output
//! verbatim in the error. Neither is retried.

use super::error::BuildError;
use super::layout::OutputLayout;
use super::types::{BuildConfiguration, BuildStage, ExtensionTarget};
use crate::env_vars;
use crate::process::{self, ProcessOutput, ProcessSpec};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// `CMake` invoker
///
/// Holds only the executable path and the per-step timeout.
#[derive(Debug, Clone)]
pub struct CMakeToolchain {
    /// Path to `CMake` executable
    cmake_path: PathBuf,
    /// Kill a step that runs longer than this
    timeout: Option<Duration>,
}

impl CMakeToolchain {
    /// Locate `CMake` and create an invoker
    ///
    /// Priority order:
    /// 1. `explicit` path (CLI flag or config file)
    /// 2. `CMAKE` environment variable
    /// 3. `cmake` in `PATH`
    /// 4. Error if not found
    pub fn locate(explicit: Option<&Path>) -> Result<Self, BuildError> {
        let cmake_path = Self::find_cmake_executable(explicit)?;
        crate::debug!("using cmake at {}", cmake_path.display());
        Ok(Self::with_path(cmake_path))
    }

    /// Use a known `CMake` executable without searching
    pub fn with_path(cmake_path: impl Into<PathBuf>) -> Self {
        Self {
            cmake_path: cmake_path.into(),
            timeout: None,
        }
    }

    /// Kill configure/build steps that run longer than `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Path of the executable this invoker runs
    pub fn cmake_path(&self) -> &Path {
        &self.cmake_path
    }

    /// Find `CMake` executable on the system
    fn find_cmake_executable(explicit: Option<&Path>) -> Result<PathBuf, BuildError> {
        if let Some(path) = explicit {
            if path.is_file() {
                return Ok(path.to_path_buf());
            }
            return which::which(path).map_err(|_| BuildError::ToolchainMissing {
                detail: format!("configured path {} does not exist", path.display()),
            });
        }

        // Check CMAKE environment variable
        if let Some(cmake_env) = env_vars::cmake() {
            let path = PathBuf::from(&cmake_env);
            if path.is_file() {
                return Ok(path);
            }
            crate::debug!("CMAKE={cmake_env} does not exist, searching PATH");
        }

        which::which("cmake").map_err(|e| BuildError::ToolchainMissing {
            detail: format!("not on PATH: {e}"),
        })
    }

    /// Configure step command for `target`
    ///
    /// Runs from the build directory with the source directory as its first
    /// argument, followed by the output-directory pins, the configuration's
    /// options, compiler overrides from the environment, and the generator
    /// architecture when one is set.
    pub fn configure_spec(
        &self,
        target: &ExtensionTarget,
        config: &BuildConfiguration,
        layout: &OutputLayout,
    ) -> ProcessSpec {
        let build_dir = config.build_dir_for(target);

        let mut spec = ProcessSpec::new(&self.cmake_path)
            .arg(&target.source_dir)
            .args(layout.configure_defines())
            .args(
                config
                    .options
                    .iter()
                    .map(|(key, value)| format!("-D{key}={value}")),
            );

        // CMake respects both CMAKE_* and standard compiler variables
        for (var, value, option) in env_vars::compiler_overrides() {
            spec = spec.env(var, &value).arg(format!("-D{option}={value}"));
        }

        if let Some(arch) = &config.architecture {
            spec = spec.arg("-A").arg(arch);
        }

        let timeout = self.step_timeout(config);
        spec.current_dir(build_dir).timeout(timeout)
    }

    /// Build step command for the configured build directory
    pub fn build_spec(&self, build_dir: &Path, config: &BuildConfiguration) -> ProcessSpec {
        ProcessSpec::new(&self.cmake_path)
            .arg("--build")
            .arg(build_dir)
            .arg("--config")
            .arg(config.profile.as_str())
            .current_dir(build_dir)
            .timeout(self.step_timeout(config))
    }

    /// The configuration's timeout wins over the invoker's own
    fn step_timeout(&self, config: &BuildConfiguration) -> Option<Duration> {
        config.timeout.or(self.timeout)
    }

    /// Run the configure step
    ///
    /// Creates the build directory first; an existing directory from an
    /// earlier run is reused as-is.
    pub fn configure(
        &self,
        target: &ExtensionTarget,
        config: &BuildConfiguration,
        layout: &OutputLayout,
    ) -> Result<ProcessOutput, BuildError> {
        let build_dir = config.build_dir_for(target);
        std::fs::create_dir_all(&build_dir).map_err(|source| BuildError::BuildDir {
            path: build_dir.clone(),
            source,
        })?;

        let spec = self.configure_spec(target, config, layout);
        let output = process::run(&spec).map_err(|source| BuildError::Process {
            stage: BuildStage::Configuring,
            source,
        })?;

        if !output.success() {
            return Err(BuildError::ConfigureFailed {
                command: spec.command_line(),
                dir: build_dir,
                code: output.code_display(),
                output: output.combined(),
            });
        }

        Ok(output)
    }

    /// Run the build step
    pub fn build(
        &self,
        build_dir: &Path,
        config: &BuildConfiguration,
    ) -> Result<ProcessOutput, BuildError> {
        let spec = self.build_spec(build_dir, config);
        let output = process::run(&spec).map_err(|source| BuildError::Process {
            stage: BuildStage::Building,
            source,
        })?;

        if !output.success() {
            return Err(BuildError::BuildFailed {
                command: spec.command_line(),
                dir: build_dir.to_path_buf(),
                code: output.code_display(),
                output: output.combined(),
            });
        }

        Ok(output)
    }
}
