//! Toolchain and splvkit environment variable handling.

use std::env;
use std::time::Duration;

// Helper for boolean environment variables that accept "1", "true", "yes"
fn is_enabled(var: &str) -> bool {
    env::var(var).ok().is_some_and(|s| {
        let s = s.to_lowercase();
        s == "1" || s == "true" || s == "yes"
    })
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|s| !s.trim().is_empty())
}

// Build tool overrides - forwarded to the CMake configure step

/// Get explicit `CMake` executable path.
pub fn cmake() -> Option<String> {
    non_empty("CMAKE")
}

/// Get C compiler override.
pub fn cc() -> Option<String> {
    non_empty("CC")
}

/// Get C++ compiler override.
pub fn cxx() -> Option<String> {
    non_empty("CXX")
}

/// Get extra C compiler flags.
pub fn cflags() -> Option<String> {
    non_empty("CFLAGS")
}

/// Get extra C++ compiler flags.
pub fn cxxflags() -> Option<String> {
    non_empty("CXXFLAGS")
}

/// Get extra linker flags.
pub fn ldflags() -> Option<String> {
    non_empty("LDFLAGS")
}

// splvkit behaviour

/// Get the per-process timeout (seconds) from `SPLVKIT_TIMEOUT`.
///
/// Zero or an unparsable value means no timeout.
pub fn process_timeout() -> Option<Duration> {
    env::var("SPLVKIT_TIMEOUT")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Check if debug logging is enabled.
pub fn debug() -> bool {
    is_enabled("SPLVKIT_DEBUG")
}

/// Get the extension module suffix override (e.g. `.cpython-312-x86_64-linux-gnu.so`).
pub fn extension_suffix() -> Option<String> {
    non_empty("SPLVKIT_EXT_SUFFIX")
}

/// Get an explicit config file path.
pub fn config_path() -> Option<String> {
    non_empty("SPLVKIT_CONFIG")
}

/// Compiler-related `CMake` cache definitions derived from the environment.
///
/// Returns `(env var, value, cmake option)` triples for every variable that
/// is set, in a fixed order.
pub fn compiler_overrides() -> Vec<(&'static str, String, &'static str)> {
    [
        ("CC", cc(), "CMAKE_C_COMPILER"),
        ("CXX", cxx(), "CMAKE_CXX_COMPILER"),
        ("CFLAGS", cflags(), "CMAKE_C_FLAGS"),
        ("CXXFLAGS", cxxflags(), "CMAKE_CXX_FLAGS"),
        ("LDFLAGS", ldflags(), "CMAKE_MODULE_LINKER_FLAGS"),
    ]
    .into_iter()
    .filter_map(|(var, value, option)| value.map(|v| (var, v, option)))
    .collect()
}
