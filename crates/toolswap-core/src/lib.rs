//! # toolswap Core
//!
//! Core types shared across the toolswap workspace.
//! Provides the error model, the closed set of firmware dialects,
//! and the machine facts a host resolves before post-processing.

pub mod dialect;
pub mod error;

pub use dialect::{FirmwareContext, FirmwareDialect};
pub use error::{ensure_finite, ensure_finite_opt, ConfigError};
