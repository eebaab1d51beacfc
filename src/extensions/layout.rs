//! Output layout planning
//!
//! Multi-config generators (Visual Studio, Xcode, Ninja Multi-Config) pick
//! the output directory from a *configuration-suffixed* variable such as
//! `CMAKE_LIBRARY_OUTPUT_DIRECTORY_RELEASE`, ignoring the plain one; single
//! config generators do the opposite. The layout therefore pins one
//! directory under every suffix for every output kind, so the artifact lands
//! in the same place whichever variable the generator reads.
//!
//! The layout also lists the file names the artifact may appear under,
//! canonical name first.

use super::types::{ArtifactCandidate, BuildConfiguration, ExtensionTarget};
use crate::platform::HostPlatform;
use std::path::{Path, PathBuf};

/// Output kinds `CMake` has separate directory variables for
pub const OUTPUT_KINDS: [&str; 3] = ["RUNTIME", "LIBRARY", "ARCHIVE"];

/// Configuration suffixes a generator may append to the variable name
///
/// The empty suffix is the plain variable. Adding a configuration here is
/// all it takes to pin it as well.
pub const CONFIG_SUFFIXES: [&str; 5] = ["", "_RELEASE", "_DEBUG", "_RELWITHDEBINFO", "_MINSIZEREL"];

/// Subdirectory of the build directory that receives all outputs
pub const OUTPUT_SUBDIR: &str = "out";

/// Where the toolchain is told to write, and what to look for afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    output_dir: PathBuf,
    candidates: Vec<ArtifactCandidate>,
}

impl OutputLayout {
    /// Layout with an explicit directory and candidate list
    pub fn new(output_dir: impl Into<PathBuf>, candidates: Vec<ArtifactCandidate>) -> Self {
        Self {
            output_dir: output_dir.into(),
            candidates,
        }
    }

    /// Plan the layout for building `target` under `config`
    pub fn plan(target: &ExtensionTarget, config: &BuildConfiguration) -> Self {
        let output_dir = config.build_dir_for(target).join(OUTPUT_SUBDIR);
        let candidates =
            candidates_for(&target.name, config.platform, config.extension_suffix.as_deref());
        Self::new(output_dir, candidates)
    }

    /// Directory every output kind is written to
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Candidate names in precedence order
    pub fn candidates(&self) -> &[ArtifactCandidate] {
        &self.candidates
    }

    /// Full paths the resolver checks, in precedence order
    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        self.candidates
            .iter()
            .map(|c| self.output_dir.join(&c.file_name))
            .collect()
    }

    /// `CMake` variable name -> directory, for every kind and suffix
    pub fn directory_mapping(&self) -> Vec<(String, &Path)> {
        OUTPUT_KINDS
            .iter()
            .flat_map(|kind| {
                CONFIG_SUFFIXES
                    .iter()
                    .map(move |suffix| format!("CMAKE_{kind}_OUTPUT_DIRECTORY{suffix}"))
            })
            .map(|variable| (variable, self.output_dir.as_path()))
            .collect()
    }

    /// The mapping rendered as configure arguments
    pub fn configure_defines(&self) -> Vec<String> {
        self.directory_mapping()
            .into_iter()
            .map(|(variable, dir)| format!("-D{variable}={}", dir.display()))
            .collect()
    }
}

/// File names the extension module `name` may be produced under
///
/// The canonical platform name always comes first (preceded by the
/// configured suffix override, when there is one). On Windows the MSVC front
/// end sometimes ignores the module suffix and writes a plain `.dll`, which
/// is accepted as an alternate.
pub fn candidates_for(
    name: &str,
    platform: HostPlatform,
    suffix_override: Option<&str>,
) -> Vec<ArtifactCandidate> {
    let native = format!("{name}{}", platform.extension_suffix());
    let mut candidates = Vec::new();

    if let Some(suffix) = suffix_override
        && suffix != platform.extension_suffix()
    {
        candidates.push(ArtifactCandidate::canonical(format!("{name}{suffix}")));
    }
    candidates.push(ArtifactCandidate::canonical(native));

    if platform == HostPlatform::Windows {
        candidates.push(ArtifactCandidate::alternate(format!(
            "{name}{}",
            platform.shared_library_suffix()
        )));
    }

    candidates
}
