use signaltab::observability::{MetricsCollector, StageMetrics};
use std::sync::Arc;

#[test]
fn test_collector_registration() {
    let mut collector = MetricsCollector::new();
    collector.register(Arc::new(StageMetrics::new("stage1")));

    let snapshot = collector.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.contains_key("stage1"));
    assert!(collector.get_stage_metrics("stage1").is_some());
    assert!(collector.get_stage_metrics("stage2").is_none());
}

#[test]
fn test_collector_aggregation() {
    let mut collector = MetricsCollector::new();

    let m1 = Arc::new(StageMetrics::new("stage1"));
    let m2 = Arc::new(StageMetrics::new("stage2"));

    m1.record_event_emitted();
    m1.record_event_emitted();
    m2.record_event_emitted();
    m2.record_decode_error();

    collector.register(m1);
    collector.register(m2);

    let snapshot = collector.snapshot();
    assert_eq!(snapshot["stage1"].events_emitted, 2);
    assert_eq!(snapshot["stage2"].events_emitted, 1);
    assert_eq!(snapshot["stage2"].decode_errors, 1);
}
