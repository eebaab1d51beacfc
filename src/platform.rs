//! Host platform detection
//!
//! The build only distinguishes two platform families: Windows and
//! everything Unix-like. The family decides the native extension-module
//! suffix and which extra configure options the toolchain needs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform family the extension is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPlatform {
    /// Windows (MSVC or MinGW toolchains)
    Windows,
    /// Linux, macOS, BSD
    Unix,
}

impl HostPlatform {
    /// Detect the platform this process is running on
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) { Self::Windows } else { Self::Unix }
    }

    /// Native suffix of a Python extension module on this platform
    #[must_use]
    pub const fn extension_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".pyd",
            Self::Unix => ".so",
        }
    }

    /// Suffix of a generic shared library on this platform
    #[must_use]
    pub const fn shared_library_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".dll",
            Self::Unix => ".so",
        }
    }

    /// Suffix of standalone executables on this platform
    #[must_use]
    pub const fn executable_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Unix => "",
        }
    }

    /// Lowercase name used in config files and log output
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Unix => "unix",
        }
    }
}

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "windows" | "win32" | "win64" => Ok(Self::Windows),
            "unix" | "linux" | "macos" | "darwin" => Ok(Self::Unix),
            other => Err(format!("unknown platform '{other}' (expected windows or unix)")),
        }
    }
}

/// Whether the host process is 64-bit
///
/// On Windows this decides whether the Visual Studio generator is asked for
/// the `x64` architecture.
#[must_use]
pub const fn is_64bit_host() -> bool {
    cfg!(target_pointer_width = "64")
}
