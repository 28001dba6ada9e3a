use signaltab::engine::{ClassifierStage, StageState};
use signaltab::model::mock::StaticLoader;
use signaltab::model::ModelCache;
use signaltab::ClassifierConfig;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_stage_state_transitions() {
    assert!(StageState::NotStarted.can_transition_to(&StageState::Running));
    assert!(StageState::Running.can_transition_to(&StageState::Stopped));
    assert!(!StageState::Stopped.can_transition_to(&StageState::Running));
    assert!(!StageState::Running.can_transition_to(&StageState::NotStarted));
}

#[test]
fn test_stage_reports_stopped_after_run() {
    let cache = Arc::new(ModelCache::sig53(Arc::new(StaticLoader::new(vec![0.0; 53]))));
    let stage = ClassifierStage::new("state", ClassifierConfig::default(), cache).unwrap();
    assert_eq!(stage.state().name(), "NotStarted");

    let (tx, reader) = signaltab::engine::sample_pipe(1);
    drop(tx);
    let (writer, _rx) = signaltab::engine::event_pipe(1);

    let handle = stage.start(Box::new(reader), Box::new(writer)).unwrap();
    let metrics = handle.metrics();

    let deadline = Instant::now() + Duration::from_secs(2);
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(handle.is_finished());
    assert_eq!(handle.state(), StageState::Stopped);

    let report = handle.join().unwrap();
    assert_eq!(report.windows_classified, 0);
    assert_eq!(metrics.chunks_read(), 0);
}

#[test]
fn test_fatal_startup_error_leaves_stage_stopped() {
    // 50 logits against the 53-class vocabulary
    let cache = Arc::new(ModelCache::sig53(Arc::new(StaticLoader::new(vec![0.0; 50]))));
    let stage = ClassifierStage::new("fatal", ClassifierConfig::default(), cache).unwrap();

    let (_tx, reader) = signaltab::engine::sample_pipe(1);
    let (writer, _rx) = signaltab::engine::event_pipe(1);
    let handle = stage.start(Box::new(reader), Box::new(writer)).unwrap();

    let deadline = Instant::now() + Duration::from_secs(2);
    while !handle.is_finished() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(handle.state(), StageState::Stopped);
    assert!(handle.join().unwrap_err().is_fatal());
}
