//! Header Set
//!
//! Produces the compilation unit that includes the FourCC-bearing headers.
//! Finding the headers is left to the preprocessor's own search paths.

use fourcc_core::config::DEFAULT_HEADERS;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Headers included by the synthesized compilation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSet {
    headers: Vec<String>,
}

impl HeaderSet {
    /// Create a header set from `<...>` include names
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
        }
    }

    /// Header names in include order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Text of the compilation unit: one `#include` per header
    pub fn source(&self) -> String {
        self.headers
            .iter()
            .map(|h| format!("#include <{}>\n", h))
            .collect()
    }

    /// Write the compilation unit to `path`, replacing any existing file
    pub fn synthesize(&self, path: &Path) -> io::Result<()> {
        debug!("Writing compilation unit for {} headers to {:?}", self.headers.len(), path);
        fs::write(path, self.source())
    }
}

impl Default for HeaderSet {
    fn default() -> Self {
        Self::new(DEFAULT_HEADERS.iter().copied())
    }
}
