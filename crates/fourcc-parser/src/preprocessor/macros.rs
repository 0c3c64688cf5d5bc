//! Macro Definitions
//!
//! `-D`/`-U` flags passed to the preprocessor.

use std::str::FromStr;
use thiserror::Error;

/// A macro definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroDefinition {
    pub name: String,
    pub value: Option<String>,
}

impl MacroDefinition {
    /// Create a macro that is simply defined (value `1`)
    pub fn defined(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: Some("1".to_string()),
        }
    }

    /// Create a macro with a specific value
    pub fn with_value(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: Some(value.to_string()),
        }
    }

    /// Create an undefined macro (for -U flag)
    pub fn undefined(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: None,
        }
    }

    /// Convert to clang -D/-U argument
    pub fn to_clang_arg(&self) -> String {
        match &self.value {
            Some(v) => format!("-D{}={}", self.name, v),
            None => format!("-U{}", self.name),
        }
    }
}

/// Invalid `NAME[=VALUE]` or `!NAME` definition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid macro definition: {0:?}")]
pub struct InvalidMacro(pub String);

impl FromStr for MacroDefinition {
    type Err = InvalidMacro;

    /// Parse `NAME` or `NAME=VALUE` (as clang's `-D` takes them), or
    /// `!NAME` to undefine
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(name) = s.trim().strip_prefix('!') {
            if !is_identifier(name) {
                return Err(InvalidMacro(s.to_string()));
            }
            return Ok(Self::undefined(name));
        }

        let (name, value) = match s.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value)),
            None => (s.trim(), None),
        };
        if !is_identifier(name) {
            return Err(InvalidMacro(s.to_string()));
        }

        Ok(match value {
            Some(v) => Self::with_value(name, v),
            None => Self::defined(name),
        })
    }
}

fn is_identifier(name: &str) -> bool {
    name.chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
