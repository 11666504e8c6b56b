//! Post-processing configuration for toolswap
//!
//! Provides configuration file handling and validation for the tool-change
//! scripts. Supports JSON and TOML file formats, with a default location in
//! the platform-specific config directory.
//!
//! Configuration is organized into two sections:
//! - Firmware facts shared by every script (native retraction, temperature control)
//! - The ordered list of scripts to run, each with its own settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use toolswap_core::{ConfigError, FirmwareContext};
use toolswap_postproc::{
    FilamentChangeParams, FilamentChangeTransformer, PauseSwapParams, PauseSwapTransformer,
    ProcessorHandle, ProcessorPipeline,
};

use crate::error::{SettingsError, SettingsResult};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.json`
    Json,
    /// `.toml`
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// One configured post-processing script
///
/// Serialized with a `script` tag, e.g. in TOML:
///
/// ```toml
/// [[scripts]]
/// script = "pause_at_tool_change"
/// dialect = "reprap"
/// unload_amount = 450.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "script", rename_all = "snake_case")]
pub enum ScriptSettings {
    /// Replace later tool changes with `M600`
    FilamentChange {
        /// Whether the script runs
        #[serde(default = "default_enabled")]
        enabled: bool,
        /// Script settings
        #[serde(flatten)]
        params: FilamentChangeParams,
    },
    /// Replace later tool changes with a park, unload and pause sequence
    PauseAtToolChange {
        /// Whether the script runs
        #[serde(default = "default_enabled")]
        enabled: bool,
        /// Script settings
        #[serde(flatten)]
        params: PauseSwapParams,
    },
}

impl ScriptSettings {
    /// Names accepted by [`ScriptSettings::from_name`]
    pub const NAMES: [&'static str; 2] = ["filament_change", "pause_at_tool_change"];

    /// Default settings for the script registered under `name`
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name.trim() {
            "filament_change" => Ok(Self::FilamentChange {
                enabled: true,
                params: FilamentChangeParams::default(),
            }),
            "pause_at_tool_change" => Ok(Self::PauseAtToolChange {
                enabled: true,
                params: PauseSwapParams::default(),
            }),
            _ => Err(ConfigError::UnknownScript {
                name: name.to_string(),
            }),
        }
    }

    /// Registered script name
    pub fn name(&self) -> &'static str {
        match self {
            Self::FilamentChange { .. } => "filament_change",
            Self::PauseAtToolChange { .. } => "pause_at_tool_change",
        }
    }

    /// Whether the script runs
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::FilamentChange { enabled, .. } | Self::PauseAtToolChange { enabled, .. } => {
                *enabled
            }
        }
    }

    /// Check the script settings without building a transformer
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::FilamentChange { params, .. } => params.validate(),
            Self::PauseAtToolChange { params, .. } => params.validate(),
        }
    }

    /// Build the transformer for this script
    pub fn build(&self, firmware: FirmwareContext) -> Result<ProcessorHandle, ConfigError> {
        let processor: ProcessorHandle = match self {
            Self::FilamentChange { enabled, params } => {
                Arc::new(FilamentChangeTransformer::new(params.clone())?.with_enabled(*enabled))
            }
            Self::PauseAtToolChange { enabled, params } => Arc::new(
                PauseSwapTransformer::new(params.clone(), firmware)?.with_enabled(*enabled),
            ),
        };
        Ok(processor)
    }
}

/// Complete post-processing configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Machine facts shared by every script
    pub firmware: FirmwareContext,
    /// Scripts to run, in order
    pub scripts: Vec<ScriptSettings>,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location: `<config dir>/toolswap/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("toolswap").join("config.toml"))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::info!(
            "Loaded {} post-processing scripts from {}",
            config.scripts.len(),
            path.display()
        );
        Ok(config)
    }

    /// Load config from file, or fall back to defaults if the file does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::from_path(path)? {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::SaveError(format!("{}: {}", parent.display(), e)))?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        for script in &self.scripts {
            script.validate()?;
        }
        Ok(())
    }

    /// Append a script with default settings
    pub fn add_script(&mut self, name: &str) -> SettingsResult<&mut ScriptSettings> {
        self.scripts.push(ScriptSettings::from_name(name)?);
        let index = self.scripts.len() - 1;
        Ok(&mut self.scripts[index])
    }

    /// Build every configured script into a pipeline
    ///
    /// All transformers are constructed before the pipeline is returned, so a
    /// bad setting fails here and never half-way through a job.
    pub fn build_pipeline(&self) -> SettingsResult<ProcessorPipeline> {
        let mut pipeline = ProcessorPipeline::new();
        for script in &self.scripts {
            pipeline.register(script.build(self.firmware)?);
        }
        tracing::debug!("Built pipeline with {} scripts", pipeline.processor_count());
        Ok(pipeline)
    }
}
