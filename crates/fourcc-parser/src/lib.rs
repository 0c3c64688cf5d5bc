//! FourCC DB Parser
//!
//! Builds the FourCC database from C headers: a synthesized compilation unit
//! is expanded by the Clang preprocessor and the expanded text is scanned for
//! FourCC constant assignments.
//!
//! ## Modules
//!
//! - `preprocessor` - Compilation unit synthesis and Clang integration
//! - `extract` - Constant pattern scan and FourCC decoding
//! - `pipeline` - Synthesize, preprocess, extract, clean up

pub mod extract;
pub mod pipeline;
pub mod preprocessor;

pub use extract::{ConstantExtractor, ExtractError, PrefixSet};
pub use pipeline::{Pipeline, TempArtifacts};
pub use preprocessor::{ClangPreprocessor, PreprocessError, PreprocessResult};

use fourcc_core::{Config, FourCcEntry};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that abort a database build
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("Failed to write compilation unit {path:?}")]
    Synthesis {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error("Failed to read preprocessed output {path:?}")]
    ReadExpanded {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Config(#[from] fourcc_core::Error),
}

/// Result type alias for the parser crate
pub type Result<T> = std::result::Result<T, ParserError>;

/// Expands the macros of one C source file into another file
pub trait MacroExpander {
    /// Expand `source`, writing the flat text to `dest`
    fn expand(&self, source: &Path, dest: &Path) -> std::result::Result<PreprocessResult, PreprocessError>;

    /// Get expander name
    fn name(&self) -> &str;
}

/// Build the database with the Clang preprocessor described by `config`
pub fn build_database(config: &Config) -> Result<Vec<FourCcEntry>> {
    config.validate()?;

    let options = preprocessor::PreprocessOptions::from_config(&config.preprocessor)
        .map_err(|e| fourcc_core::Error::Config(e.to_string()))?;
    let clang = ClangPreprocessor::from_config(&config.preprocessor)?.with_options(options);
    match clang.version() {
        Some(version) => debug!("Using {:?}: {}", clang.clang_path(), version),
        None => warn!("{:?} did not report a version", clang.clang_path()),
    }

    Pipeline::new(clang, config)?.run()
}

#[cfg(test)]
mod tests;
