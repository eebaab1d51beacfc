//! Native extension building
//!
//! Builds the encoder's Python extension module with `CMake` and stages the
//! result into the package directory:
//!
//! - [`layout`] pins the toolchain's output directory and lists the file
//!   names the module may be written under
//! - [`toolchain`] runs the configure and build steps
//! - [`resolver`] picks the single artifact the build produced
//! - [`stager`] copies it (and any auxiliary binaries) into the package
//! - [`builder`] runs the pipeline end to end

pub mod builder;
pub mod error;
pub mod layout;
pub mod resolver;
pub mod stager;
pub mod toolchain;
pub mod types;

pub use builder::{BuildPlan, BuildReport, ExtensionBuilder, build_extensions};
pub use error::BuildError;
pub use layout::{OutputLayout, candidates_for};
pub use resolver::{clear_stale_candidates, resolve_artifact};
pub use stager::stage;
pub use toolchain::CMakeToolchain;
pub use types::{
    ArtifactCandidate, BuildConfiguration, BuildProfile, BuildResult, BuildStage, CandidateKind,
    ExtensionTarget, ResolvedArtifact, StagedPackage,
};
