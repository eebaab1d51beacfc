//! Benchmark corpus sweep
//!
//! The dataset is a two-level tree: each directory under the root is a piece
//! of content, and each directory under that holds the same content voxelized
//! at one resolution (the directory name):
//!
//! ```text
//! dataset/
//!   dancer/
//!     128/
//!     256/
//!   smoke/
//!     64/
//! ```
//!
//! [`run_sweep`] walks the tree and runs the benchmark executable once per
//! resolution directory with a fixed encoder parameter set.

mod corpus;
mod sweep;

pub use corpus::CorpusWalker;
pub use sweep::{BenchmarkSweep, CaseResult, SweepSummary, run_sweep};

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default dataset directory, relative to the working directory
pub const DEFAULT_DATASET_DIR: &str = "dataset";

/// Default scratch file the benchmark writes its encoded output to
pub const DEFAULT_OUTPUT_FILE: &str = "temp.splv";

/// Default benchmark executable name (without platform suffix)
pub const DEFAULT_TOOL_NAME: &str = "splv_benchmark";

/// Encoder parameters shared by every case of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepParams {
    /// Frames per second (`-f`)
    pub framerate: u32,
    /// Group-of-pictures size (`-g`)
    pub gop_size: u32,
    /// Maximum brick group size (`-b`)
    pub max_brickgroup_size: u32,
    /// Motion vector search (`-m on|off`)
    pub motion_vectors: bool,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            framerate: 30,
            gop_size: 10,
            max_brickgroup_size: 512,
            motion_vectors: true,
        }
    }
}

impl SweepParams {
    /// `on`/`off` as the benchmark expects it
    pub const fn motion_vectors_flag(&self) -> &'static str {
        if self.motion_vectors { "on" } else { "off" }
    }
}

/// One benchmark invocation: a content directory at one resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkCase {
    /// Content group name (first-level directory)
    pub content: String,
    /// Cubic grid resolution (second-level directory name)
    pub resolution: u32,
    /// Directory holding the frames for this case
    pub dir: PathBuf,
}

impl fmt::Display for BenchmarkCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.content, self.resolution)
    }
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Dataset directory not found: {}. Clone or download the dataset first", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("Invalid resolution directory '{name}' in {}", .path.display())]
    InvalidDatasetEntry { path: PathBuf, name: String },

    #[error("Benchmark failed for {}: {reason}", .dir.display())]
    BenchmarkCaseFailed { dir: PathBuf, reason: String },
}

/// Parse a resolution directory name
///
/// Only plain positive decimal integers are accepted: no sign, no
/// whitespace, no zero.
pub fn parse_resolution(name: &str) -> Option<u32> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse::<u32>().ok().filter(|&n| n > 0)
}
