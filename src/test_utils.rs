//! Shared test utilities for splvkit tests
//!
//! Stand-ins for the external tools, so the build pipeline can be exercised
//! without a real compiler toolchain.

#[cfg(all(test, unix))]
pub(crate) mod fixtures {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    /// How the fake `cmake` behaves
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum FakeCMake {
        /// Configure and build succeed; the build writes the given names
        Succeeds,
        /// Configure prints a diagnostic and exits 1
        ConfigureFails,
        /// Build prints a diagnostic and exits 2
        BuildFails,
    }

    /// Write an executable shell script at `path`
    pub(crate) fn write_script(path: &Path, body: &str) {
        fs::write(path, format!("#!/bin/sh\n{body}")).expect("Failed to write script");
        let mut perms = fs::metadata(path)
            .expect("Failed to stat script")
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).expect("Failed to chmod script");
    }

    /// Create a fake `cmake` in `dir`
    ///
    /// Configure remembers the pinned library output directory in the build
    /// directory; build then creates each of `outputs` there.
    pub(crate) fn fake_cmake(dir: &Path, behavior: FakeCMake, outputs: &[&str]) -> PathBuf {
        let path = dir.join("cmake");
        let touch: String = outputs
            .iter()
            .map(|name| format!("  : > \"$out/{name}\"\n"))
            .collect();

        let build_failure = if behavior == FakeCMake::BuildFails {
            "  echo \"error: undefined reference to splv_encoder_create\" >&2\n  exit 2\n"
        } else {
            ""
        };
        let configure_failure = if behavior == FakeCMake::ConfigureFails {
            "echo \"CMake Error: Could not find pybind11\" >&2\nexit 1\n"
        } else {
            ""
        };

        let body = format!(
            r#"if [ "$1" = "--build" ]; then
  out=$(cat "$2/.fake_out_dir")
{build_failure}  mkdir -p "$out"
{touch}  echo "[100%] Built target splv"
  exit 0
fi
printf '%s\n' "$@" > .fake_configure_args
for arg in "$@"; do
  case "$arg" in
    -DCMAKE_LIBRARY_OUTPUT_DIRECTORY=*) printf '%s' "${{arg#*=}}" > .fake_out_dir ;;
  esac
done
{configure_failure}echo "-- Configuring done"
"#
        );
        write_script(&path, &body);
        path
    }
}
