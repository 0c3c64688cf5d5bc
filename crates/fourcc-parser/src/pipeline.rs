//! Extraction Pipeline
//!
//! synthesize -> preprocess -> extract, with both temporary files removed on
//! every exit path.

use fourcc_core::{Config, FourCcEntry};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::extract::{ConstantExtractor, PrefixSet};
use crate::preprocessor::HeaderSet;
use crate::{MacroExpander, ParserError, Result};

/// Temporary compilation unit and expanded output of one run
///
/// Both files are removed when the guard is dropped. Removal failures are
/// logged and never surface as errors.
#[derive(Debug)]
pub struct TempArtifacts {
    source: PathBuf,
    expanded: PathBuf,
}

impl TempArtifacts {
    /// Per-process artifact names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        let (source, expanded) = artifact_paths(dir);
        Self { source, expanded }
    }

    /// Path of the synthesized compilation unit
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Path of the preprocessor output
    pub fn expanded(&self) -> &Path {
        &self.expanded
    }

    fn remove(path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => debug!("Removed {:?}", path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove temporary file {:?}: {}", path, e),
        }
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        Self::remove(&self.source);
        Self::remove(&self.expanded);
    }
}

fn artifact_paths(dir: &Path) -> (PathBuf, PathBuf) {
    let stem = format!("fourcc-{}", std::process::id());
    (dir.join(format!("{}.c", stem)), dir.join(format!("{}.i", stem)))
}

/// One database build
pub struct Pipeline<E> {
    expander: E,
    headers: HeaderSet,
    extractor: ConstantExtractor,
    work_dir: PathBuf,
}

impl<E: MacroExpander> Pipeline<E> {
    /// Create a pipeline from configuration
    pub fn new(expander: E, config: &Config) -> Result<Self> {
        config.validate()?;

        let extractor = ConstantExtractor::new(&PrefixSet::from_config(&config.extract))?;

        Ok(Self {
            expander,
            headers: HeaderSet::new(config.headers.iter().cloned()),
            extractor,
            work_dir: config.work_dir.clone(),
        })
    }

    /// The macro expander driving this pipeline
    pub fn expander(&self) -> &E {
        &self.expander
    }

    /// Compilation unit and expanded output paths used by [`Pipeline::run`]
    pub fn artifact_paths(&self) -> (PathBuf, PathBuf) {
        artifact_paths(&self.work_dir)
    }

    /// Run the whole pipeline
    ///
    /// Either every entry is returned or an error is; temporary files are
    /// gone in both cases.
    pub fn run(&self) -> Result<Vec<FourCcEntry>> {
        let artifacts = TempArtifacts::in_dir(&self.work_dir);

        self.headers
            .synthesize(artifacts.source())
            .map_err(|source| ParserError::Synthesis {
                path: artifacts.source().to_path_buf(),
                source,
            })?;

        info!("Expanding {} headers with {}", self.headers.headers().len(), self.expander.name());
        let result = self.expander.expand(artifacts.source(), artifacts.expanded())?;
        if !result.warnings.is_empty() {
            debug!("Preprocessor reported {} warnings", result.warnings.len());
        }

        let text = fs::read(&result.output).map_err(|source| ParserError::ReadExpanded {
            path: result.output.clone(),
            source,
        })?;
        debug!("Expanded text is {} bytes", text.len());

        let entries = self.extractor.extract(&text)?;
        if entries.is_empty() {
            warn!("No FourCC constants found in the expanded headers");
        }
        info!("Extracted {} FourCC constants", entries.len());

        Ok(entries)
    }
}
