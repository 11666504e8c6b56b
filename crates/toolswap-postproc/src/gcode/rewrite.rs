//! Forward scan that replaces tool-change markers
//!
//! Both post-processing scripts share one scan: walk every line of every layer
//! in print order, keep the very first tool-change marker of the job, and hand
//! every later marker to a macro synthesizer. The scan state is threaded
//! through the whole layer sequence and never reset per layer.

use serde::Serialize;

use super::scanner::ScannedLine;

/// Running state of one forward scan
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScanState {
    /// Whether the job's first tool-change marker has been passed
    pub seen_first_marker: bool,
    /// Most recent Z value read so far (0 until a line carries one)
    pub current_height: f64,
}

impl ScanState {
    /// Create the state for the start of a job
    pub fn new() -> Self {
        Self::default()
    }

    /// Track the vertical position from a line
    pub fn observe(&mut self, line: &ScannedLine<'_>) {
        if let Some(z) = line.param('Z') {
            self.current_height = z;
        }
    }
}

/// Outcome of one scan over a layer sequence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    /// Number of layers visited
    pub layers_scanned: usize,
    /// Tool-change markers encountered, including the kept first one
    pub markers_seen: usize,
    /// Markers replaced by a macro
    pub markers_replaced: usize,
    /// Layer holding the kept first marker
    pub first_marker_layer: Option<usize>,
}

impl RewriteSummary {
    /// True when no layer was modified
    pub fn is_unchanged(&self) -> bool {
        self.markers_replaced == 0
    }
}

/// Synthesizes the replacement for a tool-change marker
pub trait ToolChangeMacro {
    /// Append the macro for a replaced marker to `out`
    ///
    /// `state` reflects every line read before the marker, plus the marker
    /// line itself. Each appended line must end with `\n`.
    fn write_macro(&self, state: &ScanState, out: &mut String);
}

/// Scan `layers` in order and replace every tool-change marker after the first
///
/// A layer with no replaced marker is left untouched, byte for byte. In a
/// rebuilt layer every line ends with a newline; lines that already had one
/// keep their terminator.
pub fn rewrite_tool_changes<M>(layers: &mut [String], synthesizer: &M) -> RewriteSummary
where
    M: ToolChangeMacro + ?Sized,
{
    let mut state = ScanState::new();
    let mut summary = RewriteSummary {
        layers_scanned: layers.len(),
        ..RewriteSummary::default()
    };

    for (layer_index, layer) in layers.iter_mut().enumerate() {
        let mut rewritten = String::with_capacity(layer.len());
        let mut replaced_here = 0usize;

        for raw in layer.split_inclusive('\n') {
            let line = ScannedLine::new(raw);
            state.observe(&line);

            if !line.is_tool_change() {
                rewritten.push_str(raw);
                continue;
            }

            summary.markers_seen += 1;
            if !state.seen_first_marker {
                state.seen_first_marker = true;
                summary.first_marker_layer = Some(layer_index);
                tracing::debug!(
                    "Keeping first tool change '{}' in layer {}",
                    line.text(),
                    layer_index
                );
                rewritten.push_str(raw);
            } else {
                tracing::debug!(
                    "Replacing tool change '{}' in layer {} at Z{:.2}",
                    line.text(),
                    layer_index,
                    state.current_height
                );
                synthesizer.write_macro(&state, &mut rewritten);
                replaced_here += 1;
            }
        }

        if replaced_here > 0 {
            if !rewritten.ends_with('\n') {
                rewritten.push('\n');
            }
            summary.markers_replaced += replaced_here;
            *layer = rewritten;
        }
    }

    summary
}
