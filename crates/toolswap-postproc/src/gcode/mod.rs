//! G-Code line handling shared by the post-processing scripts
//!
//! This module provides:
//! - Line scanning and parameter extraction
//! - Tool-change marker detection
//! - Command line synthesis
//! - The forward rewrite scan and its state
//! - The processor pipeline

pub mod command;
pub mod pipeline;
pub mod rewrite;
pub mod scanner;

pub use command::*;
pub use pipeline::*;
pub use rewrite::*;
pub use scanner::*;
