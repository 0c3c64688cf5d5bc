//! Error types for the FourCC database

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid FourCC literal: {0:?}")]
    InvalidFourCc(String),

    #[error("Entry {name} has raw value {raw_value} but FourCC {four_cc:?} packs to {expected}")]
    InconsistentEntry {
        name: String,
        four_cc: String,
        raw_value: u32,
        expected: u32,
    },
}

/// Result type alias for the core crate
pub type Result<T> = std::result::Result<T, Error>;
