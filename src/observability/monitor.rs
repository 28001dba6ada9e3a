use super::MetricsCollector;

pub struct PipelineMonitor {
    collector: MetricsCollector,
}

impl PipelineMonitor {
    pub fn new(collector: MetricsCollector) -> Self {
        Self { collector }
    }

    pub fn generate_report(&self) -> String {
        let snapshot = self.collector.snapshot();

        if snapshot.is_empty() {
            return "No stages registered".to_string();
        }

        let mut ids: Vec<&String> = snapshot.keys().collect();
        ids.sort();

        let mut report = String::from("=== Classifier Metrics ===\n");
        for id in ids {
            let m = &snapshot[id];
            let errors = m.decode_errors + m.write_errors;
            report.push_str(&format!(
                "\n[{}]\n  Samples: {}\n  Windows: {} classified, {} events\n  Errors: {} ({} decode, {} write)\n  Avg Inference: {}μs\n",
                id,
                m.samples_buffered,
                m.windows_classified,
                m.events_emitted,
                errors,
                m.decode_errors,
                m.write_errors,
                m.avg_inference_us
            ));
        }

        report
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }
}
