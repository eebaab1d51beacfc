//! Extension build type definitions
//!
//! An [`ExtensionTarget`] says *what* to build and where it ends up; a
//! [`BuildConfiguration`] says *how* the toolchain is configured for it.
//! Both are fixed for the duration of one build.

use super::error::BuildError;
use super::layout::OUTPUT_KINDS;
use crate::platform::{self, HostPlatform};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// `CMake` cache variable selecting the optimization profile
pub const BUILD_TYPE_OPTION: &str = "CMAKE_BUILD_TYPE";

/// Option that turns on the Python bindings target
pub const DEFAULT_BINDINGS_OPTION: &str = "BUILD_PYTHON_BINDINGS";

/// Windows-only option forcing symbol export from shared libraries
pub const EXPORT_ALL_SYMBOLS_OPTION: &str = "CMAKE_WINDOWS_EXPORT_ALL_SYMBOLS";

/// Generator architecture requested on 64-bit Windows hosts
pub const WINDOWS_X64_ARCHITECTURE: &str = "x64";

/// Build directory name used when none is configured
pub const DEFAULT_BUILD_DIR: &str = "build";

/// One buildable native extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionTarget {
    /// Extension module name (e.g. `splv_encoder_py`)
    pub name: String,
    /// Toolchain project root (directory holding `CMakeLists.txt`)
    pub source_dir: PathBuf,
    /// Package directory the artifact is staged into
    pub destination: PathBuf,
    /// Optional directory of companion binaries staged next to the artifact
    pub aux_bin_dir: Option<PathBuf>,
}

impl ExtensionTarget {
    /// Create a target with no auxiliary binaries
    pub fn new(
        name: impl Into<String>,
        source_dir: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            source_dir: source_dir.into(),
            destination: destination.into(),
            aux_bin_dir: None,
        }
    }

    /// Also stage the files found in `dir`
    #[must_use]
    pub fn with_aux_bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.aux_bin_dir = Some(dir.into());
        self
    }
}

/// Optimization profile
///
/// Only release builds are exposed; the type exists so the profile name is
/// spelled in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildProfile {
    #[default]
    Release,
}

impl BuildProfile {
    /// Name the toolchain expects (`--config` and `CMAKE_BUILD_TYPE`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Release => "Release",
        }
    }
}

impl fmt::Display for BuildProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Toolchain configuration for one build
///
/// Construct with [`BuildConfiguration::release`] (or
/// [`BuildConfiguration::for_host`]) which fills in the complete option
/// mapping; later tweaks go through the `with_*` methods and are checked by
/// [`BuildConfiguration::validate`] before configure runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    /// Platform family being built for
    pub platform: HostPlatform,
    /// Optimization profile
    pub profile: BuildProfile,
    /// `-D` cache options passed to configure, in sorted order
    pub options: BTreeMap<String, String>,
    /// Name of the option enabling the companion-language bindings
    pub bindings_option: String,
    /// Build directory (defaults to `<source>/build`)
    pub build_dir: Option<PathBuf>,
    /// Generator architecture (`-A`), Windows only
    pub architecture: Option<String>,
    /// Extension module suffix override (e.g. an ABI-tagged `.so`)
    pub extension_suffix: Option<String>,
    /// Per-step process timeout (`None` waits forever)
    pub timeout: Option<Duration>,
}

impl BuildConfiguration {
    /// Complete release configuration for `platform`
    pub fn release(platform: HostPlatform) -> Self {
        let profile = BuildProfile::Release;
        let mut options = BTreeMap::new();
        options.insert(BUILD_TYPE_OPTION.to_string(), profile.as_str().to_string());
        options.insert(DEFAULT_BINDINGS_OPTION.to_string(), "ON".to_string());

        let mut architecture = None;
        if platform == HostPlatform::Windows {
            options.insert(EXPORT_ALL_SYMBOLS_OPTION.to_string(), "TRUE".to_string());
            if platform::is_64bit_host() {
                architecture = Some(WINDOWS_X64_ARCHITECTURE.to_string());
            }
        }

        Self {
            platform,
            profile,
            options,
            bindings_option: DEFAULT_BINDINGS_OPTION.to_string(),
            build_dir: None,
            architecture,
            extension_suffix: None,
            timeout: None,
        }
    }

    /// Release configuration for the platform this process runs on
    pub fn for_host() -> Self {
        Self::release(HostPlatform::current())
    }

    /// Set an extra toolchain option
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Use a differently named bindings option (the old name is dropped)
    #[must_use]
    pub fn with_bindings_option(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.options.remove(&self.bindings_option);
        self.options.insert(name.clone(), "ON".to_string());
        self.bindings_option = name;
        self
    }

    /// Build in `dir` instead of `<source>/build`
    #[must_use]
    pub fn with_build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = Some(dir.into());
        self
    }

    /// Expect the extension module under a non-default suffix
    #[must_use]
    pub fn with_extension_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.extension_suffix = Some(suffix.into());
        self
    }

    /// Kill toolchain steps that run longer than `timeout`
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build directory for `target`
    pub fn build_dir_for(&self, target: &ExtensionTarget) -> PathBuf {
        self.build_dir
            .clone()
            .unwrap_or_else(|| target.source_dir.join(DEFAULT_BUILD_DIR))
    }

    /// Check that the option mapping is complete and self-consistent
    ///
    /// The build type must match the profile, the bindings option must be
    /// `ON`, and Windows builds must export all symbols. Output directories
    /// belong to the layout and may not be set as options.
    pub fn validate(&self) -> Result<(), BuildError> {
        if let Some(key) = self.options.keys().find(|key| is_output_directory_option(key)) {
            return Err(BuildError::InvalidConfiguration(format!(
                "{key} cannot be set: every output directory is pinned to <build dir>/out"
            )));
        }

        let expect = |key: &str, value: &str| -> Result<(), BuildError> {
            match self.options.get(key) {
                Some(actual) if actual.eq_ignore_ascii_case(value) => Ok(()),
                Some(actual) => Err(BuildError::InvalidConfiguration(format!(
                    "{key} is '{actual}', expected '{value}'"
                ))),
                None => Err(BuildError::InvalidConfiguration(format!(
                    "{key} is missing from the option set"
                ))),
            }
        };

        expect(BUILD_TYPE_OPTION, self.profile.as_str())?;
        expect(&self.bindings_option, "ON")?;
        if self.platform == HostPlatform::Windows {
            expect(EXPORT_ALL_SYMBOLS_OPTION, "TRUE")?;
        } else if self.architecture.is_some() {
            return Err(BuildError::InvalidConfiguration(
                "a generator architecture is only meaningful on Windows".to_string(),
            ));
        }

        if let Some(suffix) = &self.extension_suffix
            && !suffix.starts_with('.')
        {
            return Err(BuildError::InvalidConfiguration(format!(
                "extension suffix '{suffix}' must start with '.'"
            )));
        }

        Ok(())
    }
}

/// Whether `key` names one of the `CMAKE_<KIND>_OUTPUT_DIRECTORY[_<CONFIG>]` variables
fn is_output_directory_option(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    OUTPUT_KINDS
        .iter()
        .any(|kind| key.starts_with(&format!("CMAKE_{kind}_OUTPUT_DIRECTORY")))
}

/// How a candidate file name relates to the platform convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// The name the extension is expected to have
    Canonical,
    /// A name some compiler front end emits instead
    Alternate,
}

/// One file name the built extension may appear under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCandidate {
    pub file_name: String,
    pub kind: CandidateKind,
}

impl ArtifactCandidate {
    pub fn canonical(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            kind: CandidateKind::Canonical,
        }
    }

    pub fn alternate(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            kind: CandidateKind::Alternate,
        }
    }
}

/// The single artifact a build produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    /// Existing file on disk
    pub path: PathBuf,
    /// Candidate the file matched
    pub candidate: ArtifactCandidate,
}

impl ResolvedArtifact {
    pub fn file_name(&self) -> &str {
        &self.candidate.file_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Files written into the package directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedPackage {
    /// Package directory
    pub destination: PathBuf,
    /// Staged copy of the extension module
    pub artifact: PathBuf,
    /// Staged copies of auxiliary binaries
    pub auxiliary: Vec<PathBuf>,
    /// Auxiliary files deliberately left out
    pub excluded: Vec<PathBuf>,
}

/// Pipeline position of a build
///
/// Builds move strictly forward through these stages and end in either
/// `Staged` or `Failed`. In a failed build's trail the entry before
/// `Failed` is the stage that was running, which is also what
/// [`BuildError::stage`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Unconfigured,
    Configuring,
    Configured,
    Building,
    Built,
    Resolving,
    Resolved,
    Staged,
    Failed,
}

impl BuildStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Configuring => "configuring",
            Self::Configured => "configured",
            Self::Building => "building",
            Self::Built => "built",
            Self::Resolving => "resolving",
            Self::Resolved => "resolved",
            Self::Staged => "staged",
            Self::Failed => "failed",
        }
    }

    /// Whether the pipeline stops here
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Staged | Self::Failed)
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of building one target, for batch reporting
#[derive(Debug)]
pub struct BuildResult {
    /// Target name
    pub target_name: String,

    /// Whether the build succeeded
    pub success: bool,

    /// Build duration
    pub duration: Duration,

    /// Staged artifact path if the build succeeded
    pub artifact: Option<PathBuf>,

    /// Error message if failed
    pub error: Option<String>,

    /// Toolchain output (stdout + stderr)
    pub output: String,

    /// Stages the build passed through, ending in `Staged` or `Failed`
    pub stages: Vec<BuildStage>,
}

impl BuildResult {
    /// Create a successful build result
    #[must_use]
    pub const fn success(
        target_name: String,
        duration: Duration,
        artifact: PathBuf,
        output: String,
    ) -> Self {
        Self {
            target_name,
            success: true,
            duration,
            artifact: Some(artifact),
            error: None,
            output,
            stages: Vec::new(),
        }
    }

    /// Create a failed build result
    #[must_use]
    pub const fn failure(
        target_name: String,
        duration: Duration,
        error: String,
        output: String,
    ) -> Self {
        Self {
            target_name,
            success: false,
            duration,
            artifact: None,
            error: Some(error),
            output,
            stages: Vec::new(),
        }
    }

    /// Attach the stage trail
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<BuildStage>) -> Self {
        self.stages = stages;
        self
    }

    /// Stage the build ended in (`Failed` for a failed build)
    pub fn final_stage(&self) -> Option<BuildStage> {
        self.stages.last().copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests can panic")]
mod tests {
    use super::*;

    #[test]
    fn release_unix_options() {
        let config = BuildConfiguration::release(HostPlatform::Unix);
        assert_eq!(config.options.get(BUILD_TYPE_OPTION).unwrap(), "Release");
        assert_eq!(config.options.get(DEFAULT_BINDINGS_OPTION).unwrap(), "ON");
        assert!(!config.options.contains_key(EXPORT_ALL_SYMBOLS_OPTION));
        assert!(config.architecture.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn release_windows_options() {
        let config = BuildConfiguration::release(HostPlatform::Windows);
        assert_eq!(config.options.get(EXPORT_ALL_SYMBOLS_OPTION).unwrap(), "TRUE");
        if platform::is_64bit_host() {
            assert_eq!(config.architecture.as_deref(), Some("x64"));
        }
        assert!(config.validate().is_ok());
    }

    #[test]
    fn debug_build_type_is_rejected() {
        let config =
            BuildConfiguration::release(HostPlatform::Unix).with_option(BUILD_TYPE_OPTION, "Debug");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("CMAKE_BUILD_TYPE"));
    }

    #[test]
    fn disabled_bindings_are_rejected() {
        let config = BuildConfiguration::release(HostPlatform::Unix)
            .with_option(DEFAULT_BINDINGS_OPTION, "OFF");
        assert!(config.validate().is_err());
    }

    #[test]
    fn renamed_bindings_option_replaces_default() {
        let config =
            BuildConfiguration::release(HostPlatform::Unix).with_bindings_option("SPLV_PYTHON");
        assert!(!config.options.contains_key(DEFAULT_BINDINGS_OPTION));
        assert_eq!(config.options.get("SPLV_PYTHON").unwrap(), "ON");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn windows_without_export_is_rejected() {
        let mut config = BuildConfiguration::release(HostPlatform::Windows);
        config.options.remove(EXPORT_ALL_SYMBOLS_OPTION);
        assert!(config.validate().is_err());
    }

    #[test]
    fn suffix_must_start_with_dot() {
        let config = BuildConfiguration::release(HostPlatform::Unix).with_extension_suffix("so");
        assert!(config.validate().is_err());
    }

    #[test]
    fn output_directory_options_are_rejected() {
        for key in [
            "CMAKE_LIBRARY_OUTPUT_DIRECTORY",
            "CMAKE_RUNTIME_OUTPUT_DIRECTORY_RELEASE",
            "cmake_archive_output_directory_debug",
        ] {
            let config =
                BuildConfiguration::release(HostPlatform::Unix).with_option(key, "/elsewhere");
            let err = config.validate().unwrap_err();
            assert!(matches!(err, BuildError::InvalidConfiguration(_)));
            assert!(err.to_string().contains(key), "{err}");
        }
    }

    #[test]
    fn unrelated_cmake_options_are_accepted() {
        let config = BuildConfiguration::release(HostPlatform::Unix)
            .with_option("CMAKE_INSTALL_PREFIX", "/opt/splv")
            .with_option("SPLV_AVX2", "ON");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn build_dir_defaults_under_source() {
        let target = ExtensionTarget::new("ext", "/src/project", "/pkg");
        let config = BuildConfiguration::release(HostPlatform::Unix);
        assert_eq!(
            config.build_dir_for(&target),
            PathBuf::from("/src/project/build")
        );

        let config = config.with_build_dir("/tmp/b");
        assert_eq!(config.build_dir_for(&target), PathBuf::from("/tmp/b"));
    }
}
