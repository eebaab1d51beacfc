//! Dataset traversal

use super::{BenchError, BenchmarkCase, parse_resolution};
use std::path::Path;
use walkdir::WalkDir;

/// Lazy iterator over the benchmark cases under a dataset root
///
/// Yields cases in file-name order. Resolution directories whose names are
/// not positive integers are skipped with a warning and remembered in
/// [`CorpusWalker::skipped`]; plain files at either level are ignored.
pub struct CorpusWalker {
    entries: walkdir::IntoIter,
    skipped: Vec<BenchError>,
}

impl std::fmt::Debug for CorpusWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusWalker")
            .field("skipped", &self.skipped)
            .finish_non_exhaustive()
    }
}

impl CorpusWalker {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let entries = WalkDir::new(root)
            .min_depth(2)
            .max_depth(2)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();
        Self {
            entries,
            skipped: Vec::new(),
        }
    }

    /// Entries skipped so far
    pub fn skipped(&self) -> &[BenchError] {
        &self.skipped
    }
}

impl Iterator for CorpusWalker {
    type Item = BenchmarkCase;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.entries.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    crate::warning!("skipping unreadable dataset entry: {e}");
                    continue;
                }
            };

            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let content = entry
                .path()
                .parent()
                .and_then(Path::file_name)
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let Some(resolution) = parse_resolution(&name) else {
                crate::warning!(
                    "skipping benchmark {}: invalid resolution",
                    entry.path().display()
                );
                self.skipped.push(BenchError::InvalidDatasetEntry {
                    path: entry.path().to_path_buf(),
                    name,
                });
                continue;
            };

            return Some(BenchmarkCase {
                content,
                resolution,
                dir: entry.into_path(),
            });
        }
        None
    }
}
