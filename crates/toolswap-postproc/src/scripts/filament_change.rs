//! Filament change on tool change
//!
//! Replaces every tool change after the first with a single `M600` filament
//! change command. Only one tool is assumed to exist, so the extra tool changes
//! a multi-material slice produces become manual filament swaps.

use serde::{Deserialize, Serialize};
use toolswap_core::{ensure_finite_opt, ConfigError};

use super::amount::{deserialize_amount, serialize_amount};
use crate::gcode::{
    rewrite_tool_changes, CommandLine, LayerProcessor, RewriteSummary, ScanState, ToolChangeMacro,
};

/// Lift applied by the firmware while the filament is swapped
const CHANGE_LIFT_Z: f64 = 10.0;

/// Trailing annotation on every generated `M600`
pub const FILAMENT_CHANGE_COMMENT: &str = "Generated by FilamentChangeOnToolChange plugin";

/// Settings for [`FilamentChangeTransformer`]
///
/// Retractions are in mm and only emitted when positive. Positions are in mm
/// and emitted whenever set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilamentChangeParams {
    /// Retraction before the head moves away from the print
    #[serde(
        serialize_with = "serialize_amount",
        deserialize_with = "deserialize_amount"
    )]
    pub initial_retract: Option<f64>,
    /// Retraction that pulls the filament out of the printer
    #[serde(
        serialize_with = "serialize_amount",
        deserialize_with = "deserialize_amount"
    )]
    pub later_retract: Option<f64>,
    /// X position for the swap
    #[serde(
        serialize_with = "serialize_amount",
        deserialize_with = "deserialize_amount"
    )]
    pub x_position: Option<f64>,
    /// Y position for the swap
    #[serde(
        serialize_with = "serialize_amount",
        deserialize_with = "deserialize_amount"
    )]
    pub y_position: Option<f64>,
}

impl Default for FilamentChangeParams {
    fn default() -> Self {
        Self {
            initial_retract: Some(30.0),
            later_retract: Some(300.0),
            x_position: Some(0.0),
            y_position: Some(0.0),
        }
    }
}

impl FilamentChangeParams {
    /// Check every numeric setting is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_finite_opt("initial_retract", self.initial_retract)?;
        ensure_finite_opt("later_retract", self.later_retract)?;
        ensure_finite_opt("x_position", self.x_position)?;
        ensure_finite_opt("y_position", self.y_position)?;
        Ok(())
    }

    /// Build the `M600` line
    ///
    /// Word order is E, L, U, X, Y, Z; some firmware reads these positionally.
    pub fn command(&self) -> CommandLine {
        let positive = |v: Option<f64>| v.filter(|v| *v > 0.0);

        let mut line = CommandLine::new('M', 600);
        if let Some(initial) = positive(self.initial_retract) {
            line = line.param('E', -initial);
        }
        if let Some(later) = positive(self.later_retract) {
            line = line.param('L', -later).param('U', -later);
        }
        line.param_opt('X', self.x_position)
            .param_opt('Y', self.y_position)
            .param('Z', CHANGE_LIFT_Z)
            .comment(FILAMENT_CHANGE_COMMENT)
    }
}

/// Replaces later tool changes with an `M600` filament change
#[derive(Debug, Clone)]
pub struct FilamentChangeTransformer {
    params: FilamentChangeParams,
    command: String,
    enabled: bool,
}

impl FilamentChangeTransformer {
    /// Create a transformer, rejecting unusable settings
    pub fn new(params: FilamentChangeParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let mut command = params.command().to_string();
        command.push('\n');
        Ok(Self {
            params,
            command,
            enabled: true,
        })
    }

    /// Enable or disable this transformer inside a pipeline
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The settings this transformer was built from
    pub fn params(&self) -> &FilamentChangeParams {
        &self.params
    }

    /// The replacement line, without terminator
    pub fn command(&self) -> &str {
        self.command.trim_end()
    }

    /// Rewrite the layers in place
    pub fn transform(&self, layers: &mut [String]) -> RewriteSummary {
        let summary = rewrite_tool_changes(layers, self);
        tracing::info!(
            "Filament change: {} of {} tool changes replaced across {} layers",
            summary.markers_replaced,
            summary.markers_seen,
            summary.layers_scanned
        );
        summary
    }
}

impl ToolChangeMacro for FilamentChangeTransformer {
    fn write_macro(&self, _state: &ScanState, out: &mut String) {
        out.push_str(&self.command);
    }
}

impl LayerProcessor for FilamentChangeTransformer {
    fn name(&self) -> &str {
        "filament_change"
    }

    fn description(&self) -> &str {
        "Replaces tool changes after the first with an M600 filament change"
    }

    fn process(&self, layers: &mut [String]) -> RewriteSummary {
        self.transform(layers)
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(initial: f64, later: f64, x: f64, y: f64) -> FilamentChangeParams {
        FilamentChangeParams {
            initial_retract: Some(initial),
            later_retract: Some(later),
            x_position: Some(x),
            y_position: Some(y),
        }
    }

    #[test]
    fn test_default_command() {
        let transformer = FilamentChangeTransformer::new(FilamentChangeParams::default()).unwrap();
        assert_eq!(
            transformer.command(),
            "M600 E-30.00 L-300.00 U-300.00 X0.00 Y0.00 Z10.00 ; Generated by FilamentChangeOnToolChange plugin"
        );
    }

    #[test]
    fn test_zero_retractions_are_omitted() {
        let command = params(0.0, 0.0, 0.0, 0.0).command();
        assert_eq!(
            command.as_str(),
            "M600 X0.00 Y0.00 Z10.00 ; Generated by FilamentChangeOnToolChange plugin"
        );
    }

    #[test]
    fn test_negative_retractions_are_omitted() {
        let command = params(-5.0, 12.5, 20.0, 30.0).command();
        assert_eq!(
            command.as_str(),
            "M600 L-12.50 U-12.50 X20.00 Y30.00 Z10.00 ; Generated by FilamentChangeOnToolChange plugin"
        );
    }

    #[test]
    fn test_unset_values_are_omitted() {
        let command = FilamentChangeParams {
            initial_retract: None,
            later_retract: None,
            x_position: None,
            y_position: Some(5.0),
        }
        .command();
        assert_eq!(
            command.as_str(),
            "M600 Y5.00 Z10.00 ; Generated by FilamentChangeOnToolChange plugin"
        );
    }

    #[test]
    fn test_transform_replaces_later_markers() {
        let transformer = FilamentChangeTransformer::new(params(30.0, 300.0, 0.0, 0.0)).unwrap();
        let mut layers = vec![
            ";LAYER:0\nT0\nG1 X1 Y1 E1\n".to_string(),
            ";LAYER:1\nT1\nG1 X2 Y2 E2\n".to_string(),
        ];

        let summary = transformer.transform(&mut layers);

        assert_eq!(layers[0], ";LAYER:0\nT0\nG1 X1 Y1 E1\n");
        assert_eq!(
            layers[1],
            ";LAYER:1\nM600 E-30.00 L-300.00 U-300.00 X0.00 Y0.00 Z10.00 ; Generated by FilamentChangeOnToolChange plugin\nG1 X2 Y2 E2\n"
        );
        assert_eq!(summary.markers_replaced, 1);
    }

    #[test]
    fn test_non_finite_settings_are_rejected() {
        let err = FilamentChangeTransformer::new(params(f64::NAN, 0.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter { ref param, .. } if param == "initial_retract"
        ));
    }

    #[test]
    fn test_processor_metadata() {
        let transformer = FilamentChangeTransformer::new(FilamentChangeParams::default())
            .unwrap()
            .with_enabled(false);
        assert_eq!(transformer.name(), "filament_change");
        assert!(!transformer.is_enabled());
    }
}
