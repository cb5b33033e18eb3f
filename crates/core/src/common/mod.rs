//! Common utilities and types used throughout the emulator core.
//!
//! This module provides the building blocks shared across components:
//! 1. **Constants:** Memory map bases, register file shape and snapshot schema version.
//! 2. **Error Handling:** The crate error taxonomy and store failures.

/// Memory map, register file and format constants.
pub mod constants;

/// Error types.
pub mod error;

pub use error::{Error, Result, StoreError};
