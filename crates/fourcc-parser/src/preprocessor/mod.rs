//! C Preprocessor Integration
//!
//! Synthesizes the compilation unit that pulls in the FourCC-bearing headers
//! and runs it through the Clang preprocessor.

pub mod clang;
pub mod headers;
pub mod macros;

pub use clang::{ClangPreprocessor, PreprocessError, PreprocessOptions, PreprocessResult};
pub use headers::HeaderSet;
pub use macros::MacroDefinition;
