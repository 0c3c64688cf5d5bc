//! Constant Extractor
//!
//! Scans macro-expanded header text for assignments of the shape
//!
//! ```text
//! kCMPixelFormat_32BGRA = 'BGRA',
//! ```
//!
//! and decodes the quoted literal into its packed big-endian value.
//!
//! Scanning and decoding are separate steps: [`ConstantExtractor::scan`]
//! finds textual candidates, [`decode_candidate`] turns one candidate into a
//! [`FourCcEntry`]. The text is handled as bytes, so literals containing
//! non-ASCII or non-UTF-8 bytes are still packed numerically.

use fourcc_core::config::{ExtractConfig, DEFAULT_PREFIXES};
use fourcc_core::{FourCc, FourCcEntry};
use regex::bytes::Regex;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during extraction
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No constant prefixes configured")]
    NoPrefixes,

    #[error("Invalid constant pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("FourCC literal for {name} has {len} bytes, expected 4")]
    InvalidLiteralLength { name: String, len: usize },
}

/// Recognized constant name prefixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixSet {
    prefixes: Vec<String>,
}

impl PrefixSet {
    /// Create a prefix set
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a prefix set from the extraction configuration
    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(config.prefixes.iter().cloned())
    }

    /// Prefixes in configuration order
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

impl Default for PrefixSet {
    /// Pixel format, codec type, CoreMediaIO and audio transport type prefixes
    fn default() -> Self {
        Self::new(DEFAULT_PREFIXES.iter().copied())
    }
}

/// A textual match before decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'t> {
    /// Constant name bytes
    pub name: &'t [u8],
    /// Bytes between the single quotes
    pub literal: &'t [u8],
    /// Byte offset of the name in the scanned text
    pub offset: usize,
}

impl Candidate<'_> {
    /// Constant name, with invalid UTF-8 replaced
    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(self.name).into_owned()
    }
}

/// Decode a candidate into an entry
///
/// The literal must be exactly four bytes; anything else means the scan
/// pattern is broken and is reported as an error.
pub fn decode_candidate(candidate: &Candidate<'_>) -> Result<FourCcEntry, ExtractError> {
    let four_cc = FourCc::from_slice(candidate.literal).ok_or_else(|| {
        ExtractError::InvalidLiteralLength {
            name: candidate.name_lossy(),
            len: candidate.literal.len(),
        }
    })?;

    Ok(FourCcEntry::new(candidate.name_lossy(), four_cc))
}

/// Pattern-based FourCC constant extractor
pub struct ConstantExtractor {
    pattern: Regex,
    prefixes: PrefixSet,
}

impl ConstantExtractor {
    /// Compile the scan pattern for a prefix set
    pub fn new(prefixes: &PrefixSet) -> Result<Self, ExtractError> {
        if prefixes.is_empty() {
            return Err(ExtractError::NoPrefixes);
        }

        let alternation = prefixes
            .prefixes()
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join("|");

        // Bytes mode without Unicode: `.` is any byte (newlines included via
        // `s`), `\s`/`\S` are ASCII classes.
        let pattern = Regex::new(&format!(
            r"(?s-u)((?:{})\S+?)\s*=\s*'(.{{4}})',?",
            alternation
        ))?;

        Ok(Self {
            pattern,
            prefixes: prefixes.clone(),
        })
    }

    /// Prefixes this extractor recognizes
    pub fn prefixes(&self) -> &PrefixSet {
        &self.prefixes
    }

    /// Find every non-overlapping candidate, in order of appearance
    ///
    /// A prefix that occurs in the middle of an identifier (`MY_kCMIOFoo`)
    /// does not start a name, so such matches are skipped.
    pub fn scan<'t>(&self, text: &'t [u8]) -> Vec<Candidate<'t>> {
        let mut candidates = Vec::new();

        for caps in self.pattern.captures_iter(text) {
            let (Some(name), Some(literal)) = (caps.get(1), caps.get(2)) else {
                continue;
            };

            if name.start() > 0 && is_identifier_byte(text[name.start() - 1]) {
                debug!(
                    "Skipping {:?} at offset {}: prefix inside a longer identifier",
                    String::from_utf8_lossy(name.as_bytes()),
                    name.start()
                );
                continue;
            }

            candidates.push(Candidate {
                name: name.as_bytes(),
                literal: literal.as_bytes(),
                offset: name.start(),
            });
        }

        candidates
    }

    /// Extract all entries from expanded text, in order of appearance
    pub fn extract(&self, text: &[u8]) -> Result<Vec<FourCcEntry>, ExtractError> {
        let candidates = self.scan(text);
        debug!("Found {} FourCC candidates", candidates.len());

        let mut entries = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            if !candidate.name.iter().copied().all(is_identifier_byte) {
                warn!(
                    "Constant name {:?} at offset {} is not a plain identifier; \
                     the expanded text may have merged two tokens",
                    candidate.name_lossy(),
                    candidate.offset
                );
            }
            entries.push(decode_candidate(candidate)?);
        }

        Ok(entries)
    }
}

/// Extract entries using the default prefixes
pub fn extract_entries(text: &[u8]) -> Result<Vec<FourCcEntry>, ExtractError> {
    ConstantExtractor::new(&PrefixSet::default())?.extract(text)
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
