//! FourCC DB Core
//!
//! Core types shared by the extraction pipeline, the lookup database and
//! the command-line tool.

pub mod config;
pub mod error;
pub mod fourcc;

pub use config::Config;
pub use error::{Error, Result};
pub use fourcc::{FourCc, FourCcEntry};
