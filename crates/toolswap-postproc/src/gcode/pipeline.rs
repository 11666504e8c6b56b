//! Post-processing script pipeline

use serde::Serialize;
use std::sync::Arc;

use super::RewriteSummary;

/// Trait for layer post-processors
///
/// A processor rewrites the per-layer blocks of a sliced job in place.
/// Processors are built, and their settings validated, before any layer is
/// touched; `process` itself cannot fail.
///
/// # Examples
/// - Filament change on tool change
/// - Pause and park on tool change
pub trait LayerProcessor: Send + Sync {
    /// Get the name/identifier of this processor
    fn name(&self) -> &str;

    /// Get a description of what this processor does
    fn description(&self) -> &str;

    /// Rewrite the layers in place
    ///
    /// # Arguments
    /// * `layers` - One text block per layer, in print order
    ///
    /// # Returns
    /// What the scan found and changed.
    fn process(&self, layers: &mut [String]) -> RewriteSummary;

    /// Check if this processor is enabled
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Arc-wrapped processor for thread-safe sharing
pub type ProcessorHandle = Arc<dyn LayerProcessor>;

/// Result of one processor run inside a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessorReport {
    /// Name of the processor
    pub processor: String,
    /// What the processor changed
    pub summary: RewriteSummary,
}

/// Ordered chain of layer processors
///
/// Each enabled processor sees the output of the one before it.
///
/// # Example
/// ```ignore
/// let mut pipeline = ProcessorPipeline::new();
/// pipeline.register(Arc::new(FilamentChangeTransformer::new(params)?));
///
/// let reports = pipeline.process_layers(&mut layers);
/// ```
pub struct ProcessorPipeline {
    processors: Vec<ProcessorHandle>,
}

impl ProcessorPipeline {
    /// Create a new empty processor pipeline
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Register a processor in the pipeline
    ///
    /// Processors are applied in the order they are registered.
    pub fn register(&mut self, processor: ProcessorHandle) -> &mut Self {
        self.processors.push(processor);
        self
    }

    /// Register multiple processors at once
    pub fn register_all(&mut self, processors: Vec<ProcessorHandle>) -> &mut Self {
        self.processors.extend(processors);
        self
    }

    /// Get the number of registered processors
    pub fn processor_count(&self) -> usize {
        self.processors.len()
    }

    /// Get a reference to a processor by name
    pub fn get_processor_by_name(&self, name: &str) -> Option<&ProcessorHandle> {
        self.processors.iter().find(|p| p.name() == name)
    }

    /// List all registered processors
    pub fn list_processors(&self) -> Vec<(&str, &str, bool)> {
        self.processors
            .iter()
            .map(|p| (p.name(), p.description(), p.is_enabled()))
            .collect()
    }

    /// Run every enabled processor over the layers, in order
    pub fn process_layers(&self, layers: &mut [String]) -> Vec<ProcessorReport> {
        let mut reports = Vec::new();

        for processor in &self.processors {
            if !processor.is_enabled() {
                tracing::debug!("Skipping disabled processor '{}'", processor.name());
                continue;
            }

            let summary = processor.process(layers);
            reports.push(ProcessorReport {
                processor: processor.name().to_string(),
                summary,
            });
        }

        reports
    }

    /// Clear all processors from the pipeline
    pub fn clear(&mut self) {
        self.processors.clear();
    }
}

impl Default for ProcessorPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Suffix {
        name: &'static str,
        enabled: bool,
    }

    impl LayerProcessor for Suffix {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Appends the processor name to every layer"
        }

        fn process(&self, layers: &mut [String]) -> RewriteSummary {
            for layer in layers.iter_mut() {
                layer.push_str(self.name);
            }
            RewriteSummary {
                layers_scanned: layers.len(),
                ..RewriteSummary::default()
            }
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }
    }

    #[test]
    fn test_processors_run_in_order() {
        let mut pipeline = ProcessorPipeline::new();
        pipeline
            .register(Arc::new(Suffix {
                name: "a",
                enabled: true,
            }))
            .register(Arc::new(Suffix {
                name: "b",
                enabled: true,
            }));

        let mut layers = vec![String::from("x"), String::from("y")];
        let reports = pipeline.process_layers(&mut layers);

        assert_eq!(layers, vec!["xab".to_string(), "yab".to_string()]);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].processor, "a");
        assert_eq!(reports[1].summary.layers_scanned, 2);
    }

    #[test]
    fn test_disabled_processors_are_skipped() {
        let processors: Vec<ProcessorHandle> = vec![
            Arc::new(Suffix {
                name: "on",
                enabled: true,
            }),
            Arc::new(Suffix {
                name: "off",
                enabled: false,
            }),
        ];
        let mut pipeline = ProcessorPipeline::default();
        pipeline.register_all(processors);

        let mut layers = vec![String::new()];
        let reports = pipeline.process_layers(&mut layers);

        assert_eq!(layers[0], "on");
        assert_eq!(reports.len(), 1);
        assert_eq!(pipeline.processor_count(), 2);
        assert!(pipeline.get_processor_by_name("off").is_some());
        assert!(!pipeline.list_processors()[1].2);

        pipeline.clear();
        assert_eq!(pipeline.processor_count(), 0);
    }

    #[test]
    fn test_report_json_shape() {
        let report = ProcessorReport {
            processor: "pause_at_tool_change".to_string(),
            summary: RewriteSummary {
                layers_scanned: 4,
                markers_seen: 3,
                markers_replaced: 2,
                first_marker_layer: Some(1),
            },
        };

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({
                "processor": "pause_at_tool_change",
                "summary": {
                    "layers_scanned": 4,
                    "markers_seen": 3,
                    "markers_replaced": 2,
                    "first_marker_layer": 1
                }
            })
        );
    }
}
