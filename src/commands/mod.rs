//! CLI subcommand implementations

pub(crate) mod bench;
pub(crate) mod build;
pub(crate) mod completion;
pub(crate) mod config;
