//! Clang Preprocessor Integration
//!
//! Wraps `clang -E` so the framework headers are reduced to flat,
//! macro-expanded text that the constant extractor can scan.

use fourcc_core::config::PreprocessorConfig;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

use super::macros::{InvalidMacro, MacroDefinition};
use crate::MacroExpander;

/// Errors that can occur during preprocessing
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Clang not found. Please install clang or pass its path explicitly.")]
    ClangNotFound,

    #[error("Failed to run preprocessor {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Preprocessor exited with {status}:\n{stderr}")]
    PreprocessFailed { status: ExitStatus, stderr: String },

    #[error("Invalid source file: {0}")]
    InvalidSource(String),
}

/// Options for preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    /// Macro definitions (-D/-U flags)
    pub defines: Vec<MacroDefinition>,
    /// Include paths (-I flags)
    pub includes: Vec<PathBuf>,
    /// Framework search paths (-F flags)
    pub frameworks: Vec<PathBuf>,
    /// SDK root (-isysroot)
    pub sysroot: Option<PathBuf>,
    /// Additional clang arguments
    pub extra_args: Vec<String>,
    /// Generate line markers
    pub line_markers: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            defines: Vec::new(),
            includes: Vec::new(),
            frameworks: Vec::new(),
            sysroot: None,
            extra_args: Vec::new(),
            line_markers: true,
        }
    }
}

impl PreprocessOptions {
    /// Build options from the preprocessor section of the configuration
    pub fn from_config(config: &PreprocessorConfig) -> Result<Self, InvalidMacro> {
        let defines = config
            .defines
            .iter()
            .map(|d| d.parse())
            .collect::<Result<Vec<MacroDefinition>, _>>()?;

        Ok(Self {
            defines,
            includes: config.include_dirs.clone(),
            frameworks: config.framework_dirs.clone(),
            sysroot: config.sysroot.clone(),
            extra_args: config.extra_args.clone(),
            line_markers: true,
        })
    }
}

/// Result of preprocessing
#[derive(Debug)]
pub struct PreprocessResult {
    /// File holding the macro-expanded text
    pub output: PathBuf,
    /// Warnings generated during preprocessing
    pub warnings: Vec<String>,
}

/// Clang preprocessor wrapper
pub struct ClangPreprocessor {
    /// Path to clang executable
    clang_path: PathBuf,
    /// Flags applied to every invocation
    options: PreprocessOptions,
}

impl ClangPreprocessor {
    /// Create a new preprocessor, auto-detecting clang location
    pub fn new() -> Result<Self, PreprocessError> {
        let clang_path = Self::find_clang()?;
        debug!("Found clang at: {:?}", clang_path);
        Ok(Self::with_path(clang_path))
    }

    /// Create a preprocessor with a specific clang path
    pub fn with_path(clang_path: PathBuf) -> Self {
        Self {
            clang_path,
            options: PreprocessOptions::default(),
        }
    }

    /// Create a preprocessor from configuration, auto-detecting clang
    /// unless an explicit path is configured
    pub fn from_config(config: &PreprocessorConfig) -> Result<Self, PreprocessError> {
        let preprocessor = match &config.clang_path {
            Some(path) => Self::with_path(path.clone()),
            None => Self::new()?,
        };
        Ok(preprocessor)
    }

    /// Replace the invocation options
    pub fn with_options(mut self, options: PreprocessOptions) -> Self {
        self.options = options;
        self
    }

    /// Path of the clang executable
    pub fn clang_path(&self) -> &Path {
        &self.clang_path
    }

    /// Find clang executable
    fn find_clang() -> Result<PathBuf, PreprocessError> {
        let candidates = [
            "clang",
            "/usr/bin/clang",
            "/usr/local/bin/clang",
            "/opt/homebrew/bin/clang",
            "/opt/homebrew/opt/llvm/bin/clang",
        ];

        candidates
            .into_iter()
            .map(|candidate| Self::with_path(PathBuf::from(candidate)))
            .find(|preprocessor| preprocessor.is_available())
            .map(|preprocessor| preprocessor.clang_path)
            .ok_or(PreprocessError::ClangNotFound)
    }

    /// Check if clang is available
    pub fn is_available(&self) -> bool {
        Command::new(&self.clang_path)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Get clang version
    pub fn version(&self) -> Option<String> {
        Command::new(&self.clang_path)
            .arg("--version")
            .output()
            .ok()
            .and_then(|o| {
                String::from_utf8(o.stdout)
                    .ok()
                    .and_then(|s| s.lines().next().map(|l| l.to_string()))
            })
    }

    /// Preprocess `source_path`, writing the expanded text to `output_path`
    pub fn preprocess_file(
        &self,
        source_path: &Path,
        output_path: &Path,
    ) -> Result<PreprocessResult, PreprocessError> {
        if !source_path.exists() {
            return Err(PreprocessError::InvalidSource(format!(
                "File not found: {:?}",
                source_path
            )));
        }

        let args = self.build_args();
        debug!("Preprocessing {:?} with args: {:?}", source_path, args);

        let output = Command::new(&self.clang_path)
            .args(&args)
            .arg(source_path)
            .arg("-o")
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| PreprocessError::Spawn {
                path: self.clang_path.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PreprocessError::PreprocessFailed {
                status: output.status,
                stderr: stderr.to_string(),
            });
        }

        let warnings = self.parse_warnings(&output.stderr);

        Ok(PreprocessResult {
            output: output_path.to_path_buf(),
            warnings,
        })
    }

    /// Build clang command line arguments
    fn build_args(&self) -> Vec<String> {
        let options = &self.options;
        let mut args = vec![
            "-E".to_string(), // Preprocess only
        ];

        for macro_def in &options.defines {
            args.push(macro_def.to_clang_arg());
        }

        for include in &options.includes {
            args.push(format!("-I{}", include.display()));
        }

        for framework in &options.frameworks {
            args.push(format!("-F{}", framework.display()));
        }

        if let Some(sysroot) = &options.sysroot {
            args.push("-isysroot".to_string());
            args.push(sysroot.display().to_string());
        }

        args.extend(options.extra_args.iter().cloned());

        if !options.line_markers {
            args.push("-P".to_string());
        }

        args
    }

    /// Parse warnings from stderr
    fn parse_warnings(&self, stderr: &[u8]) -> Vec<String> {
        let stderr_str = String::from_utf8_lossy(stderr);
        stderr_str
            .lines()
            .filter(|line| line.contains("warning:"))
            .map(|s| s.to_string())
            .collect()
    }
}

impl MacroExpander for ClangPreprocessor {
    fn expand(&self, source: &Path, dest: &Path) -> Result<PreprocessResult, PreprocessError> {
        let result = self.preprocess_file(source, dest)?;
        for warning in &result.warnings {
            warn!("{}", warning);
        }
        Ok(result)
    }

    fn name(&self) -> &str {
        "clang"
    }
}
