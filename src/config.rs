//! Configuration file management
//!
//! Handles reading splvkit's TOML configuration from an explicit path, the
//! project directory, or the user's config directory, and turning it into
//! build and benchmark settings.
//!
//! Priority for every setting: CLI flag -> config file -> environment
//! variable -> built-in default. CLI flags are applied by the commands; this
//! module merges the rest.

use crate::bench::{self, SweepParams};
use crate::env_vars;
use crate::extensions::{BuildConfiguration, ExtensionTarget};
use crate::platform::HostPlatform;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project config file name, looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = ".splvkit.toml";

/// Application configuration loaded from TOML files
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub toolchain: ToolchainSection,
    pub build: BuildSection,
    pub bench: BenchSection,
    /// Extensions built by `splvkit build` when no `--name` is given
    #[serde(rename = "extension", skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<ExtensionEntry>,
}

/// `[toolchain]`
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ToolchainSection {
    /// `CMake` executable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmake: Option<PathBuf>,
    /// Per-step timeout in seconds (0 disables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// `[build]`
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BuildSection {
    /// Build directory (defaults to `<source>/build`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<PathBuf>,
    /// Option enabling the Python bindings target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindings_option: Option<String>,
    /// Extension module suffix override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_suffix: Option<String>,
    /// Plan for another platform family (only meaningful with `--dry-run`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<HostPlatform>,
    /// Extra `-D` options passed to configure
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

/// `[[extension]]`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ExtensionEntry {
    pub name: String,
    pub source_dir: PathBuf,
    pub destination: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aux_bin_dir: Option<PathBuf>,
}

impl ExtensionEntry {
    pub fn to_target(&self) -> ExtensionTarget {
        let target = ExtensionTarget::new(&self.name, &self.source_dir, &self.destination);
        match &self.aux_bin_dir {
            Some(dir) => target.with_aux_bin_dir(dir),
            None => target,
        }
    }
}

/// `[bench]`
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct BenchSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framerate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gop_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_brickgroup_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion_vectors: Option<bool>,
    /// Per-case timeout in seconds (0 disables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from TOML files.
    /// Priority: `SPLVKIT_CONFIG` -> ./.splvkit.toml -> ~/.config/splvkit/config.toml
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_with_options(None)
    }

    /// Load configuration, preferring `custom_path` when given.
    ///
    /// An explicit path (argument or `SPLVKIT_CONFIG`) must exist. The
    /// default locations are optional, but a file that is present and
    /// malformed is still an error rather than silently ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if config file reading or parsing fails.
    pub fn load_with_options(custom_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = custom_path {
            return Self::load_from(path);
        }

        if let Some(path) = env_vars::config_path() {
            return Self::load_from(path);
        }

        let local = Path::new(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Self::load_from(local);
        }

        if let Some(config_dir) = Self::user_config_dir() {
            let config_path = config_dir.join("config.toml");
            if config_path.is_file() {
                return Self::load_from(&config_path);
            }
        }

        crate::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from one file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid config.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        crate::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Render as TOML (what `splvkit config` prints).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    fn user_config_dir() -> Option<PathBuf> {
        // Check XDG_CONFIG_HOME first
        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg_config).join("splvkit"));
        }

        // Fall back to ~/.config/splvkit
        dirs::home_dir().map(|home| home.join(".config").join("splvkit"))
    }

    /// Configured `CMake` executable, if any (`CMAKE` is checked later by the
    /// toolchain lookup itself)
    pub fn cmake_path(&self) -> Option<&Path> {
        self.toolchain.cmake.as_deref()
    }

    /// Toolchain step timeout: config -> `SPLVKIT_TIMEOUT` -> none
    pub fn toolchain_timeout(&self) -> Option<Duration> {
        timeout_setting(self.toolchain.timeout_secs)
    }

    /// Benchmark case timeout: config -> `SPLVKIT_TIMEOUT` -> none
    pub fn bench_timeout(&self) -> Option<Duration> {
        timeout_setting(self.bench.timeout_secs)
    }

    /// Platform the build is planned for
    pub fn platform(&self) -> HostPlatform {
        self.build.platform.unwrap_or_else(HostPlatform::current)
    }

    /// Release build configuration with this config's settings applied
    pub fn build_configuration(&self) -> BuildConfiguration {
        let mut config = BuildConfiguration::release(self.platform());

        if let Some(option) = &self.build.bindings_option {
            config = config.with_bindings_option(option);
        }
        for (key, value) in &self.build.options {
            config = config.with_option(key, value);
        }
        if let Some(dir) = &self.build.build_dir {
            config = config.with_build_dir(dir);
        }
        if let Some(suffix) = self
            .build
            .extension_suffix
            .clone()
            .or_else(env_vars::extension_suffix)
        {
            config = config.with_extension_suffix(suffix);
        }

        config.with_timeout(self.toolchain_timeout())
    }

    /// Extension targets declared in the config file
    pub fn extension_targets(&self) -> Vec<ExtensionTarget> {
        self.extensions.iter().map(ExtensionEntry::to_target).collect()
    }

    /// Sweep parameters with unset values at their defaults
    pub fn sweep_params(&self) -> SweepParams {
        let defaults = SweepParams::default();
        SweepParams {
            framerate: self.bench.framerate.unwrap_or(defaults.framerate),
            gop_size: self.bench.gop_size.unwrap_or(defaults.gop_size),
            max_brickgroup_size: self
                .bench
                .max_brickgroup_size
                .unwrap_or(defaults.max_brickgroup_size),
            motion_vectors: self.bench.motion_vectors.unwrap_or(defaults.motion_vectors),
        }
    }

    /// Dataset root for the sweep
    pub fn dataset_dir(&self) -> PathBuf {
        self.bench
            .dataset
            .clone()
            .unwrap_or_else(|| PathBuf::from(bench::DEFAULT_DATASET_DIR))
    }

    /// Benchmark executable (`./splv_benchmark`, plus `.exe` on Windows)
    pub fn bench_tool(&self) -> PathBuf {
        self.bench.tool.clone().unwrap_or_else(|| {
            let name = format!(
                "{}{}",
                bench::DEFAULT_TOOL_NAME,
                HostPlatform::current().executable_suffix()
            );
            Path::new(".").join(name)
        })
    }

    /// Scratch file each case writes its encoded output to
    pub fn bench_output(&self) -> PathBuf {
        self.bench
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(bench::DEFAULT_OUTPUT_FILE))
    }
}

/// Seconds from the config file, else the environment; zero means no timeout
fn timeout_setting(configured: Option<u64>) -> Option<Duration> {
    match configured {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => env_vars::process_timeout(),
    }
}
