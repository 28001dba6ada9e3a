use super::StageMetrics;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub stage_id: String,
    pub samples_buffered: u64,
    pub windows_classified: u64,
    pub events_emitted: u64,
    pub decode_errors: u64,
    pub write_errors: u64,
    pub avg_inference_us: u64,
}

/// Registry of per-stage metrics for reporting
#[derive(Clone, Default)]
pub struct MetricsCollector {
    metrics: HashMap<String, Arc<StageMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, metrics: Arc<StageMetrics>) {
        self.metrics.insert(metrics.stage_id().to_string(), metrics);
    }

    pub fn snapshot(&self) -> HashMap<String, MetricsSnapshot> {
        self.metrics
            .iter()
            .map(|(id, m)| {
                (
                    id.clone(),
                    MetricsSnapshot {
                        stage_id: m.stage_id().to_string(),
                        samples_buffered: m.samples_buffered(),
                        windows_classified: m.windows_classified(),
                        events_emitted: m.events_emitted(),
                        decode_errors: m.decode_errors(),
                        write_errors: m.write_errors(),
                        avg_inference_us: m.avg_inference_us(),
                    },
                )
            })
            .collect()
    }

    pub fn get_stage_metrics(&self, stage_id: &str) -> Option<Arc<StageMetrics>> {
        self.metrics.get(stage_id).cloned()
    }
}
