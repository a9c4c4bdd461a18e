//! Utility functions and helpers.
//!
//! # Submodules
//!
//! - [`process`]: Running external tools with captured output and timeouts

/// External process execution
pub mod process;
