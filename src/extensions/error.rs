//! Build pipeline errors
//!
//! Every variant aborts the whole build: nothing is staged after any of
//! them. Messages carry the command line and paths needed to rerun the
//! failing step by hand.

use super::types::BuildStage;
use crate::process::ProcessError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("CMake executable not found ({detail}). Install CMake from https://cmake.org or set CMAKE")]
    ToolchainMissing { detail: String },

    #[error("Invalid build configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to create build directory {path}: {source}")]
    BuildDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CMake configure failed with exit code {code}\n  command: {command}\n  in: {dir}\n{output}")]
    ConfigureFailed {
        command: String,
        dir: PathBuf,
        code: String,
        output: String,
    },

    #[error("CMake build failed with exit code {code}\n  command: {command}\n  in: {dir}\n{output}")]
    BuildFailed {
        command: String,
        dir: PathBuf,
        code: String,
        output: String,
    },

    #[error("Failed to remove stale build output {path}: {source}")]
    StaleArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} step could not run: {source}")]
    Process {
        stage: BuildStage,
        #[source]
        source: ProcessError,
    },

    #[error("No built extension found after a successful build. Checked:\n{}", format_paths(.searched))]
    ArtifactNotFound { searched: Vec<PathBuf> },

    #[error("Auxiliary binary directory not found: {0}")]
    AuxDirMissing(PathBuf),

    #[error("Failed to stage {path}: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Pipeline stage the error ended the build in
    pub const fn stage(&self) -> BuildStage {
        match self {
            Self::ToolchainMissing { .. } | Self::InvalidConfiguration(_) => {
                BuildStage::Unconfigured
            }
            Self::BuildDir { .. } | Self::ConfigureFailed { .. } => BuildStage::Configuring,
            Self::StaleArtifact { .. } | Self::BuildFailed { .. } => BuildStage::Building,
            Self::Process { stage, .. } => *stage,
            Self::ArtifactNotFound { .. } => BuildStage::Resolving,
            Self::AuxDirMissing(_) | Self::Stage { .. } => BuildStage::Resolved,
        }
    }

    /// Raw toolchain output attached to the error, if any
    pub fn toolchain_output(&self) -> Option<&str> {
        match self {
            Self::ConfigureFailed { output, .. } | Self::BuildFailed { output, .. } => {
                Some(output)
            }
            _ => None,
        }
    }
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("  {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}
