//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Headers that declare FourCC-bearing constants
pub const DEFAULT_HEADERS: &[&str] = &[
    "CoreMedia/CMFormatDescription.h",
    "CoreMediaIO/CMIOHardware.h",
    "IOKit/audio/IOAudioTypes.h",
];

/// Constant name prefixes recognized by the extractor
pub const DEFAULT_PREFIXES: &[&str] = &[
    "kCMIO",
    "kCMPixelFormat",
    "kCMVideoCodecType",
    "kIOAudioDeviceTransportType",
];

/// FourCC database build configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for the temporary compilation unit and expanded output
    pub work_dir: PathBuf,

    /// Headers included by the synthesized compilation unit
    pub headers: Vec<String>,

    /// Preprocessor configuration
    pub preprocessor: PreprocessorConfig,

    /// Extraction configuration
    pub extract: ExtractConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir(),
            headers: DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect(),
            preprocessor: PreprocessorConfig::default(),
            extract: ExtractConfig::default(),
        }
    }
}

impl Config {
    /// Load a configuration from a YAML file
    ///
    /// Missing keys fall back to their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can drive a build
    pub fn validate(&self) -> Result<()> {
        if self.headers.is_empty() {
            return Err(Error::Config("no headers configured".to_string()));
        }
        if let Some(header) = self.headers.iter().find(|h| h.trim().is_empty()) {
            return Err(Error::Config(format!("invalid header name: {:?}", header)));
        }
        self.extract.validate()
    }
}

/// Preprocessor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessorConfig {
    /// Explicit clang executable (auto-detected when unset)
    pub clang_path: Option<PathBuf>,

    /// Include search paths (-I)
    pub include_dirs: Vec<PathBuf>,

    /// Framework search paths (-F)
    pub framework_dirs: Vec<PathBuf>,

    /// SDK root (-isysroot)
    pub sysroot: Option<PathBuf>,

    /// Macro definitions, `NAME` or `NAME=VALUE`; `!NAME` undefines
    pub defines: Vec<String>,

    /// Additional clang arguments
    pub extra_args: Vec<String>,
}

/// Extraction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Recognized constant name prefixes
    pub prefixes: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            prefixes: DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ExtractConfig {
    /// Check that at least one usable prefix is configured
    pub fn validate(&self) -> Result<()> {
        if self.prefixes.is_empty() {
            return Err(Error::Config("no constant prefixes configured".to_string()));
        }
        if self.prefixes.iter().any(|p| p.is_empty() || p.contains(char::is_whitespace)) {
            return Err(Error::Config(
                "constant prefixes must be non-empty and contain no whitespace".to_string(),
            ));
        }
        Ok(())
    }
}
