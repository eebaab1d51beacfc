//! Artifact resolution
//!
//! After a successful build exactly one file is taken as the extension:
//! the first candidate, in the layout's precedence order, that exists as a
//! regular file. When none exists the error lists every path that was
//! checked; there is no fallback to other names or directories.
//!
//! Candidates left over from an earlier build are removed before the build
//! step runs, so whatever the resolver finds was written by this build.

use super::error::BuildError;
use super::layout::OutputLayout;
use super::types::{CandidateKind, ResolvedArtifact};
use std::fs;
use std::path::PathBuf;

/// Remove every candidate file already present in the output directory
///
/// Returns the paths that were removed.
pub fn clear_stale_candidates(layout: &OutputLayout) -> Result<Vec<PathBuf>, BuildError> {
    let mut removed = Vec::new();
    for path in layout.candidate_paths() {
        if !path.is_file() {
            continue;
        }
        fs::remove_file(&path).map_err(|source| BuildError::StaleArtifact {
            path: path.clone(),
            source,
        })?;
        crate::debug!("removed stale {}", path.display());
        removed.push(path);
    }
    Ok(removed)
}

/// Find the built extension described by `layout`
pub fn resolve_artifact(layout: &OutputLayout) -> Result<ResolvedArtifact, BuildError> {
    let mut searched = Vec::with_capacity(layout.candidates().len());
    let mut resolved: Option<ResolvedArtifact> = None;

    for candidate in layout.candidates() {
        let path = layout.output_dir().join(&candidate.file_name);
        let exists = path.is_file();
        crate::debug!(
            "checking {} ({})",
            path.display(),
            if exists { "found" } else { "missing" }
        );

        match (&resolved, exists) {
            (None, true) => {
                resolved = Some(ResolvedArtifact {
                    path,
                    candidate: candidate.clone(),
                });
            }
            (Some(chosen), true) => {
                crate::debug!(
                    "ignoring {} in favour of {}",
                    path.display(),
                    chosen.path.display()
                );
            }
            (_, false) => searched.push(path),
        }
    }

    let artifact = resolved.ok_or(BuildError::ArtifactNotFound { searched })?;

    if artifact.candidate.kind == CandidateKind::Alternate {
        crate::warning!(
            "extension was built under the alternate name {}",
            artifact.file_name()
        );
    }

    Ok(artifact)
}
