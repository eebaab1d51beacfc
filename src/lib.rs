//! splvkit internal library code
//!
//! Native extension build orchestration ([`extensions`]) and the benchmark
//! corpus sweep ([`bench`]), plus the configuration, logging and process
//! plumbing they share.

pub mod bench;
pub mod config;
pub mod debug;
pub mod env_vars;
pub mod extensions;
pub mod platform;
pub mod process;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export common types for convenience
pub use bench::{BenchError, BenchmarkCase, BenchmarkSweep, CaseResult, SweepParams, run_sweep};
pub use config::Config;
pub use debug::{debug_log, init_debug, is_debug_enabled};
pub use extensions::{
    BuildConfiguration, BuildError, BuildResult, CMakeToolchain, ExtensionBuilder,
    ExtensionTarget, ResolvedArtifact, build_extensions,
};
pub use platform::HostPlatform;
pub use process::{ProcessError, ProcessOutput, ProcessSpec};
