//! Toolswap Settings Crate
//!
//! Handles post-processing configuration: which tool-change scripts run, in
//! what order, with which settings, and how they are persisted.

pub mod config;
pub mod error;

pub use config::{Config, ConfigFormat, ScriptSettings};
pub use error::{SettingsError, SettingsResult};
