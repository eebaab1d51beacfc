//! Common test utilities and helpers
//!
//! This module provides shared functionality used across integration tests:
//! - Binary path resolution (via `get_splvkit_binary`)
//! - Fake toolchain, benchmark and dataset fixtures (via `helpers`)

pub(crate) mod helpers;

// Re-export get_splvkit_binary for convenient access
#[allow(unused_imports)]
pub(crate) use helpers::get_splvkit_binary;
