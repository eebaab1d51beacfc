//! Package staging
//!
//! Copies the resolved extension into the package directory, then (when the
//! target declares one) a flat copy of the auxiliary binary directory.
//! Standalone command-line executables in that directory are not meant to
//! ship inside the package and are left out.

use super::error::BuildError;
use super::types::{ResolvedArtifact, StagedPackage};
use std::fs;
use std::path::{Path, PathBuf};

/// File name suffixes never copied from the auxiliary directory
pub const EXCLUDED_SUFFIXES: [&str; 1] = [".exe"];

/// Whether an auxiliary file named `file_name` is left out of the package
pub fn is_excluded(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    EXCLUDED_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

/// Copy `artifact` (and the auxiliary files) into `destination`
///
/// `reserved_names` are the extension's candidate file names: an auxiliary
/// file with one of those names is skipped so the package never ends up with
/// a second, possibly stale, copy of the extension.
pub fn stage(
    artifact: &ResolvedArtifact,
    destination: &Path,
    aux_bin_dir: Option<&Path>,
    reserved_names: &[&str],
) -> Result<StagedPackage, BuildError> {
    fs::create_dir_all(destination).map_err(|source| BuildError::Stage {
        path: destination.to_path_buf(),
        source,
    })?;

    let artifact_target = destination.join(artifact.file_name());
    copy_file(artifact.path(), &artifact_target)?;
    crate::debug!(
        "staged {} -> {}",
        artifact.path().display(),
        artifact_target.display()
    );

    let mut staged = StagedPackage {
        destination: destination.to_path_buf(),
        artifact: artifact_target,
        auxiliary: Vec::new(),
        excluded: Vec::new(),
    };

    if let Some(aux_dir) = aux_bin_dir {
        copy_auxiliary(aux_dir, destination, reserved_names, &mut staged)?;
    }

    Ok(staged)
}

fn copy_auxiliary(
    aux_dir: &Path,
    destination: &Path,
    reserved_names: &[&str],
    staged: &mut StagedPackage,
) -> Result<(), BuildError> {
    if !aux_dir.is_dir() {
        return Err(BuildError::AuxDirMissing(aux_dir.to_path_buf()));
    }

    let read_error = |source| BuildError::Stage {
        path: aux_dir.to_path_buf(),
        source,
    };

    let mut files: Vec<PathBuf> = fs::read_dir(aux_dir)
        .map_err(read_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_error)?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    for src in files {
        let Some(file_name) = src.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        if is_excluded(&file_name) {
            crate::debug!("not staging command-line executable {file_name}");
            staged.excluded.push(src);
            continue;
        }

        if reserved_names.contains(&file_name.as_str()) {
            crate::debug!("not staging second copy of extension {file_name}");
            staged.excluded.push(src);
            continue;
        }

        let target = destination.join(&file_name);
        copy_file(&src, &target)?;
        staged.auxiliary.push(target);
    }

    Ok(())
}

/// Copy `src` to `dst` unless both already name the same file
fn copy_file(src: &Path, dst: &Path) -> Result<(), BuildError> {
    if is_same_file(src, dst) {
        crate::debug!("{} is already in place", dst.display());
        return Ok(());
    }
    fs::copy(src, dst)
        .map(|_| ())
        .map_err(|source| BuildError::Stage {
            path: src.to_path_buf(),
            source,
        })
}

// Copying a file onto itself truncates it.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
