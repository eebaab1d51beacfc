//! Shared test helpers and utilities

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Get the path to the splvkit binary built for this test run
pub(crate) fn get_splvkit_binary() -> String {
    env!("CARGO_BIN_EXE_splvkit").to_string()
}

/// Write an executable shell script at `path`
#[cfg(unix)]
pub(crate) fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, format!("#!/bin/sh\n{body}")).expect("Failed to write script");
    let mut perms = fs::metadata(path)
        .expect("Failed to stat script")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("Failed to chmod script");
}

/// A fake `cmake` that honours the pinned library output directory
///
/// Every invocation appends its arguments (one line per call) to
/// `cmake.log` next to the script. The build step creates each of
/// `outputs` in the output directory the configure step was given.
#[cfg(unix)]
pub(crate) fn fake_cmake(dir: &Path, outputs: &[&str]) -> PathBuf {
    let touch: String = outputs
        .iter()
        .map(|name| format!("  echo \"built\" > \"$out/{name}\"\n"))
        .collect();
    let log = dir.join("cmake.log");
    let body = format!(
        r#"echo "$@" >> "{log}"
if [ "$1" = "--build" ]; then
  out=$(cat "$2/.fake_out_dir")
  mkdir -p "$out"
{touch}  echo "[100%] Built target splv_encoder_py"
  exit 0
fi
for arg in "$@"; do
  case "$arg" in
    -DCMAKE_LIBRARY_OUTPUT_DIRECTORY=*) printf '%s' "${{arg#*=}}" > .fake_out_dir ;;
  esac
done
echo "-- Configuring done"
"#,
        log = log.display()
    );
    let path = dir.join("cmake");
    write_script(&path, &body);
    path
}

/// A `cmake` whose configure step fails with a recognisable diagnostic
#[cfg(unix)]
pub(crate) fn failing_cmake(dir: &Path, message: &str) -> PathBuf {
    let path = dir.join("cmake");
    write_script(&path, &format!("echo \"{message}\" >&2\nexit 1\n"));
    path
}

/// Lines logged by [`fake_cmake`]
pub(crate) fn cmake_log(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("cmake.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// A fake benchmark executable
///
/// Logs the `-i` directory of every call to `bench.log` next to the script.
/// Exits 1 when that directory ends with one of `fail_on`, else 0.
#[cfg(unix)]
pub(crate) fn fake_benchmark(dir: &Path, fail_on: &[&str]) -> PathBuf {
    let log = dir.join("bench.log");
    let failures: String = fail_on
        .iter()
        .map(|name| format!("  */{name}) exit 1 ;;\n"))
        .collect();
    let body = format!(
        r#"input=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-i" ]; then input="$2"; fi
  shift
done
echo "$input" >> "{log}"
case "$input" in
{failures}  *) ;;
esac
exit 0
"#,
        log = log.display()
    );
    let path = dir.join("splv_benchmark");
    write_script(&path, &body);
    path
}

/// Input directories logged by [`fake_benchmark`]
pub(crate) fn bench_log(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("bench.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Create a dataset tree with the given `<content>/<resolution>` directories
pub(crate) fn create_dataset(temp_dir: &TempDir, leaves: &[&str]) -> PathBuf {
    let root = temp_dir.path().join("dataset");
    fs::create_dir_all(&root).expect("Failed to create dataset root");
    for leaf in leaves {
        fs::create_dir_all(root.join(leaf)).expect("Failed to create dataset leaf");
    }
    root
}

/// Create a source directory holding a placeholder `CMakeLists.txt`
pub(crate) fn create_extension_source(temp_dir: &TempDir) -> PathBuf {
    let source = temp_dir.path().join("native");
    fs::create_dir_all(&source).expect("Failed to create source dir");
    fs::write(
        source.join("CMakeLists.txt"),
        "cmake_minimum_required(VERSION 3.15)\nproject(splv)\n",
    )
    .expect("Failed to write CMakeLists.txt");
    source
}
