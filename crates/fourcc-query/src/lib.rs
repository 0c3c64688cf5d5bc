//! FourCC DB Query Engine
//!
//! Loads a generated FourCC database and answers value and text lookups.

use fourcc_core::{FourCc, FourCcEntry};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid database: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QueryError>;

/// In-memory FourCC database
#[derive(Debug, Clone, Default)]
pub struct FourCcDatabase {
    entries: Vec<FourCcEntry>,
}

impl FourCcDatabase {
    /// Wrap an extracted entry list
    pub fn from_entries(entries: Vec<FourCcEntry>) -> Self {
        Self { entries }
    }

    /// Parse a JSON database
    ///
    /// Records whose raw value disagrees with their FourCC are rejected.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<FourCcEntry> = serde_json::from_str(json)?;
        Ok(Self::from_entries(entries))
    }

    /// Load a JSON database file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let db = Self::from_json_str(&json)?;
        debug!("Loaded {} entries from {:?}", db.len(), path);
        Ok(db)
    }

    pub fn entries(&self) -> &[FourCcEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry with the given raw value
    pub fn entry_for_value(&self, value: u32) -> Option<&FourCcEntry> {
        self.entries.iter().find(|e| e.raw_value() == value)
    }

    /// All entries with the given raw value, in database order
    pub fn entries_for_value(&self, value: u32) -> Vec<&FourCcEntry> {
        self.entries.iter().filter(|e| e.raw_value() == value).collect()
    }

    /// Entries whose name, FourCC, hex value or decimal value contains `term`
    ///
    /// Matching ignores case. The `0x`-prefixed hex form is only searched when
    /// the term itself starts with `0x`.
    pub fn entries_matching(&self, term: &str) -> Vec<&FourCcEntry> {
        if term.is_empty() {
            return Vec::new();
        }

        let needle = term.to_lowercase();
        let prefixed = needle.starts_with("0x");

        self.entries
            .iter()
            .filter(|e| {
                let hex = format!("{:x}", e.raw_value());
                e.constant_name().to_lowercase().contains(&needle)
                    || e.four_cc().as_latin1().to_lowercase().contains(&needle)
                    || hex.contains(&needle)
                    || (prefixed && format!("0x{}", hex).contains(&needle))
                    || e.raw_value().to_string().contains(term)
            })
            .collect()
    }

    /// Human-readable form of a raw value: `'avc1' (kCMVideoCodecType_H264)`
    ///
    /// Returns `None` when the four bytes are not ASCII.
    pub fn describe(&self, value: u32) -> Option<String> {
        let fcc = FourCc::from_raw(value);
        if !fcc.bytes().is_ascii() {
            return None;
        }

        match self.entry_for_value(value) {
            Some(entry) => Some(format!("'{}' ({})", fcc.as_latin1(), entry.constant_name())),
            None => Some(format!("'{}'", fcc.as_latin1())),
        }
    }
}
