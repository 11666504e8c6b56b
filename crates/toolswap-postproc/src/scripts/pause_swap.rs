//! Pause and park on tool change
//!
//! Replaces every tool change after the first with a macro that parks the
//! head, unloads the filament, pauses for the swap, reloads, and pauses again
//! before printing resumes. What the macro contains depends on the firmware
//! dialect:
//!
//! | Dialect                | Retract and park          | Pause command |
//! |------------------------|---------------------------|---------------|
//! | Marlin / BQ / RepRap   | by the macro              | M0 / M25 / M226 |
//! | Repetier               | by the macro, own layout  | `@pause ...`  |
//! | Griffin                | by the firmware           | M0            |

use serde::{Deserialize, Serialize};
use toolswap_core::{
    ensure_finite, ensure_finite_opt, ConfigError, FirmwareContext, FirmwareDialect,
};

use super::amount::{deserialize_amount, serialize_amount};
use crate::gcode::{
    rewrite_tool_changes, CommandLine, LayerProcessor, MacroBuilder, RewriteSummary, ScanState,
    ToolChangeMacro,
};

/// Longest single unload move in mm
pub const MAX_UNLOAD_CHUNK: f64 = 200.0;
/// Longest single load move in mm
pub const MAX_LOAD_CHUNK: f64 = 100.0;
/// Minimum head clearance above the bed while parked, in mm
pub const MIN_PARK_HEIGHT: f64 = 15.0;
/// Largest unload or load amount accepted, in mm
pub const MAX_FILAMENT_AMOUNT: f64 = 10_000.0;

const LIFT_FEED: f64 = 300.0;
const TRAVEL_FEED: f64 = 9000.0;
const REPETIER_RETRACT_FEED: f64 = 6000.0;
const RELATIVE_E_COMMENT: &str = "switch to relative E values for any needed retraction";

/// Settings for [`PauseSwapTransformer`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PauseSwapParams {
    /// Firmware dialect of the target machine
    pub dialect: FirmwareDialect,
    /// Seconds before steppers disarm while paused; 0 leaves the firmware default
    pub disarm_timeout: u32,
    /// X park position in mm
    pub head_park_x: f64,
    /// Y park position in mm
    pub head_park_y: f64,
    /// Head lift in mm (Repetier)
    pub head_move_z: f64,
    /// Retraction before parking in mm; 0 disables it
    pub retraction_amount: f64,
    /// Filament pulled out once paused, in mm (e.g. Bowden tube length)
    #[serde(
        serialize_with = "serialize_amount",
        deserialize_with = "deserialize_amount"
    )]
    pub unload_amount: Option<f64>,
    /// Filament pushed in after the swap, in mm
    #[serde(
        serialize_with = "serialize_amount",
        deserialize_with = "deserialize_amount"
    )]
    pub load_amount: Option<f64>,
    /// Retraction and load speed in mm/s
    pub retraction_speed: f64,
    /// Nozzle temperature while paused
    pub standby_temperature: i32,
    /// Message shown on the printer display; empty shows nothing
    pub display_text: String,
    /// G-code emitted before the pause, verbatim
    pub custom_gcode_before_pause: String,
    /// G-code emitted after the pause, verbatim
    pub custom_gcode_after_pause: String,
}

impl Default for PauseSwapParams {
    fn default() -> Self {
        Self {
            dialect: FirmwareDialect::Marlin,
            disarm_timeout: 0,
            head_park_x: 190.0,
            head_park_y: 190.0,
            head_move_z: 15.0,
            retraction_amount: 0.0,
            unload_amount: Some(300.0),
            load_amount: Some(300.0),
            retraction_speed: 25.0,
            standby_temperature: 0,
            display_text: String::new(),
            custom_gcode_before_pause: String::new(),
            custom_gcode_after_pause: String::new(),
        }
    }
}

impl PauseSwapParams {
    /// Check every numeric setting is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_finite("head_park_x", self.head_park_x)?;
        ensure_finite("head_park_y", self.head_park_y)?;
        ensure_finite("head_move_z", self.head_move_z)?;
        ensure_finite("retraction_amount", self.retraction_amount)?;
        ensure_filament_amount("unload_amount", self.unload_amount)?;
        ensure_filament_amount("load_amount", self.load_amount)?;
        ensure_finite("retraction_speed", self.retraction_speed)?;
        Ok(())
    }

    fn filament_feed(&self) -> f64 {
        self.retraction_speed * 60.0
    }
}

fn ensure_filament_amount(param: &str, value: Option<f64>) -> Result<(), ConfigError> {
    match ensure_finite_opt(param, value)? {
        Some(v) if v > MAX_FILAMENT_AMOUNT => Err(ConfigError::invalid(
            param,
            format!("{} exceeds the {} mm limit", v, MAX_FILAMENT_AMOUNT),
        )),
        _ => Ok(()),
    }
}

/// Splits a filament move into chunks no longer than `max`
///
/// 450 with a maximum of 200 yields 200, 200, 50. Zero, negative, non-finite
/// or unset totals yield nothing. The number of chunks is fixed up front.
#[derive(Debug, Clone)]
pub struct FilamentChunks {
    full_chunks: u64,
    last: f64,
    max: f64,
}

impl FilamentChunks {
    /// Chunk `total` into moves of at most `max`
    pub fn new(total: Option<f64>, max: f64) -> Self {
        let total = total.unwrap_or(0.0);
        if !(total.is_finite() && total > 0.0 && max.is_finite() && max > 0.0) {
            return Self {
                full_chunks: 0,
                last: 0.0,
                max,
            };
        }

        let count = (total / max).ceil().max(1.0) as u64;
        let full_chunks = count - 1;
        Self {
            full_chunks,
            last: total - full_chunks as f64 * max,
            max,
        }
    }
}

impl Iterator for FilamentChunks {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.full_chunks > 0 {
            self.full_chunks -= 1;
            Some(self.max)
        } else if self.last > 0.0 {
            Some(std::mem::take(&mut self.last))
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.full_chunks as usize + usize::from(self.last > 0.0);
        (n, Some(n))
    }
}

/// Replaces later tool changes with a pause-and-swap macro
#[derive(Debug, Clone)]
pub struct PauseSwapTransformer {
    params: PauseSwapParams,
    firmware: FirmwareContext,
    enabled: bool,
}

impl PauseSwapTransformer {
    /// Create a transformer, rejecting unusable settings
    pub fn new(params: PauseSwapParams, firmware: FirmwareContext) -> Result<Self, ConfigError> {
        params.validate()?;

        let moves_filament = params.unload_amount.is_some_and(|v| v > 0.0)
            || params.load_amount.is_some_and(|v| v > 0.0);
        if moves_filament && params.retraction_speed <= 0.0 {
            tracing::warn!(
                "Retraction speed {} mm/s will stall the unload and load moves",
                params.retraction_speed
            );
        }

        Ok(Self {
            params,
            firmware,
            enabled: true,
        })
    }

    /// Enable or disable this transformer inside a pipeline
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The settings this transformer was built from
    pub fn params(&self) -> &PauseSwapParams {
        &self.params
    }

    /// The machine facts this transformer was built with
    pub fn firmware(&self) -> &FirmwareContext {
        &self.firmware
    }

    /// The full macro emitted for a tool change read at `current_height`
    pub fn macro_text(&self, current_height: f64) -> String {
        let mut out = String::new();
        self.write_macro(
            &ScanState {
                seen_first_marker: true,
                current_height,
            },
            &mut out,
        );
        out
    }

    /// Rewrite the layers in place
    pub fn transform(&self, layers: &mut [String]) -> RewriteSummary {
        let summary = rewrite_tool_changes(layers, self);
        tracing::info!(
            "Pause on tool change ({}): {} of {} tool changes replaced across {} layers",
            self.params.dialect.key(),
            summary.markers_replaced,
            summary.markers_seen,
            summary.layers_scanned
        );
        summary
    }

    /// Repetier retraction and parking
    ///
    /// The extra lift moves the head `head_move_z` above the current height,
    /// not to `head_move_z` itself, and only while the head is below
    /// `head_move_z`.
    fn write_repetier_park(&self, height: f64, out: &mut MacroBuilder<'_>) {
        let p = &self.params;

        out.line(CommandLine::new('M', 83).comment(RELATIVE_E_COMMENT));
        if p.retraction_amount != 0.0 {
            out.line(
                CommandLine::new('G', 1)
                    .param('E', p.retraction_amount)
                    .param('F', REPETIER_RETRACT_FEED),
            );
        }

        out.line(
            CommandLine::new('G', 1)
                .param('Z', height + 1.0)
                .param('F', LIFT_FEED)
                .comment("move up a millimeter to get out of the way"),
        );
        out.line(
            CommandLine::new('G', 1)
                .param('X', p.head_park_x)
                .param('Y', p.head_park_y)
                .param('F', TRAVEL_FEED),
        );
        if height < p.head_move_z {
            out.line(
                CommandLine::new('G', 1)
                    .param('Z', height + p.head_move_z)
                    .param('F', LIFT_FEED),
            );
        }

        out.line(CommandLine::new('M', 84).int_param('E', 0));
    }

    fn write_park(&self, height: f64, out: &mut MacroBuilder<'_>) {
        let p = &self.params;

        out.line(CommandLine::new('M', 83).comment(RELATIVE_E_COMMENT));
        if p.retraction_amount != 0.0 {
            if self.firmware.firmware_retract {
                // The retract distance is fixed in firmware; repeat instead
                for _ in 0..self.firmware.native_retract_count() {
                    out.line(CommandLine::new('G', 10));
                }
            } else {
                out.line(
                    CommandLine::new('G', 1)
                        .param('E', -p.retraction_amount)
                        .param('F', p.filament_feed()),
                );
            }
        }

        out.line(
            CommandLine::new('G', 1)
                .param('Z', height + 1.0)
                .param('F', LIFT_FEED)
                .comment("move up a millimeter to get out of the way"),
        );
        out.line(
            CommandLine::new('G', 1)
                .param('X', p.head_park_x)
                .param('Y', p.head_park_y)
                .param('F', TRAVEL_FEED),
        );
        if height < MIN_PARK_HEIGHT {
            out.line(
                CommandLine::new('G', 1)
                    .param('Z', MIN_PARK_HEIGHT)
                    .param('F', TRAVEL_FEED)
                    .comment("too close to bed--move to at least 15mm"),
            );
        }

        if self.firmware.control_temperatures {
            out.line(
                CommandLine::new('M', 104)
                    .int_param('S', i64::from(p.standby_temperature))
                    .comment("standby temperature"),
            );
        }
    }

    fn write_swap(&self, out: &mut MacroBuilder<'_>) {
        let p = &self.params;
        let pause = p.dialect.pause_command();

        if !p.display_text.is_empty() {
            out.line(CommandLine::new('M', 117).text(&p.display_text));
        }
        if p.disarm_timeout > 0 {
            out.line(
                CommandLine::new('M', 18)
                    .int_param('S', i64::from(p.disarm_timeout))
                    .comment("Set the disarm timeout"),
            );
        }
        if !p.custom_gcode_before_pause.is_empty() {
            out.verbatim(&p.custom_gcode_before_pause);
        }

        for chunk in FilamentChunks::new(p.unload_amount, MAX_UNLOAD_CHUNK) {
            out.line(
                CommandLine::new('G', 1)
                    .param('E', -chunk)
                    .param('F', p.filament_feed()),
            );
        }
        out.line(CommandLine::raw(pause).comment("Do the actual pause"));

        for chunk in FilamentChunks::new(p.load_amount, MAX_LOAD_CHUNK) {
            out.line(
                CommandLine::new('G', 1)
                    .param('E', chunk)
                    .param('F', p.filament_feed()),
            );
        }
        out.line(CommandLine::raw(pause).comment("Do the another pause"));

        if !p.custom_gcode_after_pause.is_empty() {
            out.verbatim(&p.custom_gcode_after_pause);
        }
        out.line(CommandLine::new('M', 82));
    }
}

impl ToolChangeMacro for PauseSwapTransformer {
    fn write_macro(&self, state: &ScanState, out: &mut String) {
        let mut builder = MacroBuilder::new(out);
        builder
            .comment("TYPE:CUSTOM")
            .comment("added code by post processing")
            .comment("script: PauseAtHeightOnToolChange.py");

        match self.params.dialect {
            FirmwareDialect::Repetier => {
                self.write_repetier_park(state.current_height, &mut builder)
            }
            dialect if dialect.parks_internally() => {}
            _ => self.write_park(state.current_height, &mut builder),
        }

        self.write_swap(&mut builder);
    }
}

impl LayerProcessor for PauseSwapTransformer {
    fn name(&self) -> &str {
        "pause_at_tool_change"
    }

    fn description(&self) -> &str {
        "Replaces tool changes after the first with a park, unload, pause and reload sequence"
    }

    fn process(&self, layers: &mut [String]) -> RewriteSummary {
        self.transform(layers)
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
