//! # Toolswap Post-Processing
//!
//! Tool-change post-processing for sliced G-code.
//! Includes the line scanner, macro synthesis, the forward rewrite scan and
//! the filament change and pause-and-swap scripts built on it.

pub mod gcode;
pub mod scripts;

pub use gcode::{
    extract_param, is_tool_change, rewrite_tool_changes, starts_with_command, CommandLine,
    LayerProcessor, MacroBuilder, ProcessorHandle, ProcessorPipeline, ProcessorReport,
    RewriteSummary, ScanState, ScannedLine, ToolChangeMacro,
};

pub use scripts::{
    FilamentChangeParams, FilamentChangeTransformer, FilamentChunks, PauseSwapParams,
    PauseSwapTransformer,
};
