//! # Toolswap
//!
//! Tool-change post-processing for sliced G-code. A multi-material slice
//! becomes printable on a single extruder by turning every tool change after
//! the first into a manual filament swap:
//! - **Filament change**: a single `M600` with configurable retractions and position
//! - **Pause and swap**: park, unload, pause, reload and pause again, per firmware dialect
//!
//! ## Architecture
//!
//! Toolswap is organized as a workspace with multiple crates:
//!
//! 1. **toolswap-core** - Firmware dialects, machine facts, errors
//! 2. **toolswap-postproc** - Line scanner, macro synthesis, the rewrite scan and both scripts
//! 3. **toolswap-settings** - Script configuration in JSON or TOML
//! 4. **toolswap** - This facade: logging setup and re-exports

pub use toolswap_core::{ConfigError, FirmwareContext, FirmwareDialect};

pub use toolswap_postproc::{
    CommandLine, FilamentChangeParams, FilamentChangeTransformer, LayerProcessor, PauseSwapParams,
    PauseSwapTransformer, ProcessorHandle, ProcessorPipeline, ProcessorReport, RewriteSummary,
};

pub use toolswap_settings::{Config, ScriptSettings, SettingsError};

use anyhow::Context;
use std::path::Path;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Output on stderr, leaving stdout free for G-code
/// - RUST_LOG environment variable support
///
/// Calling this more than once leaves the first subscriber in place.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Logging already initialized");
    }

    Ok(())
}

/// Run every script configured in `config_path` over the layers
///
/// The configuration is loaded and every script is built before any layer is
/// touched.
pub fn process_with_config(
    config_path: &Path,
    layers: &mut [String],
) -> anyhow::Result<Vec<ProcessorReport>> {
    let config = Config::load_from_file(config_path).with_context(|| {
        format!(
            "Failed to load post-processing config {}",
            config_path.display()
        )
    })?;
    let pipeline = config
        .build_pipeline()
        .context("Invalid post-processing script settings")?;

    tracing::info!(
        "Toolswap {} ({}): running {} scripts over {} layers",
        VERSION,
        BUILD_DATE,
        pipeline.processor_count(),
        layers.len()
    );
    Ok(pipeline.process_layers(layers))
}
