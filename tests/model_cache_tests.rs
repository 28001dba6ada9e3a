use signaltab::core::Sample;
use signaltab::model::mock::{logits_for, BrokenModelLoader, StaticLoader, UnavailableLoader};
use signaltab::model::{DeviceSpec, LabelTable, ModelCache, ModelLoader, ModelState};
use signaltab::ClassifierError;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn tone_window(len: usize) -> Vec<Sample> {
    (0..len)
        .map(|n| {
            let phase = n as f32 * 0.1;
            Sample::new(phase.cos() * 3.0, phase.sin() * 3.0)
        })
        .collect()
}

fn favoring_am() -> Arc<StaticLoader> {
    Arc::new(StaticLoader::favoring(&LabelTable::sig53(), "am-dsb", 0.9))
}

#[test]
fn test_classify_before_load_returns_empty() {
    let cache = ModelCache::sig53(favoring_am());

    assert_eq!(cache.state(), ModelState::Unloaded);
    assert!(cache.classify(&tone_window(64), 3).is_empty());
    assert!(cache.try_classify(&tone_window(64), 3).unwrap().is_empty());
}

#[test]
fn test_load_is_idempotent() {
    let loader = favoring_am();
    let cache = ModelCache::sig53(loader.clone());

    cache.load(&DeviceSpec::Cpu).unwrap();
    cache.load(&DeviceSpec::Cpu).unwrap();
    cache.load(&DeviceSpec::Cuda(0)).unwrap();

    assert_eq!(loader.load_count(), 1);
    assert_eq!(cache.load_attempts(), 1);
    assert_eq!(cache.state(), ModelState::Loaded { device: DeviceSpec::Cpu });
}

#[test]
fn test_concurrent_loads_run_loader_once() {
    let loader = Arc::new(
        StaticLoader::favoring(&LabelTable::sig53(), "fm", 0.8)
            .with_load_delay(Duration::from_millis(50)),
    );
    let cache = Arc::new(ModelCache::sig53(loader.clone()));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let cache = cache.clone();
            thread::spawn(move || cache.load(&DeviceSpec::Cpu))
        })
        .collect();

    for worker in workers {
        worker.join().unwrap().unwrap();
    }

    assert_eq!(loader.load_count(), 1);
    assert!(cache.is_loaded());
}

#[test]
fn test_failed_load_is_retryable_and_observable() {
    let loader = Arc::new(
        StaticLoader::favoring(&LabelTable::sig53(), "am-dsb", 0.9).failing_first(1),
    );
    let cache = ModelCache::sig53(loader.clone());

    let err = cache.load(&DeviceSpec::Cpu).unwrap_err();
    assert!(matches!(err, ClassifierError::ModelLoad(_)));
    assert!(!err.is_fatal());
    assert_eq!(cache.state().name(), "Failed");
    assert!(cache.last_error().unwrap().contains("simulated"));
    assert!(cache.classify(&tone_window(32), 3).is_empty());

    cache.load(&DeviceSpec::Cpu).unwrap();
    assert!(cache.is_loaded());
    assert_eq!(cache.load_attempts(), 2);
    assert!(cache.last_error().is_none());
}

#[test]
fn test_unavailable_runtime_fails_load() {
    let cache = ModelCache::sig53(Arc::new(UnavailableLoader));
    let err = cache.load(&DeviceSpec::Cpu).unwrap_err();
    assert_eq!(err.kind(), "model_load");
    assert!(!cache.is_loaded());
}

#[test]
fn test_predictions_are_ranked_and_bounded() {
    let labels = LabelTable::sig53();
    let logits = logits_for(&labels, &[("am-dsb", 0.6), ("fm", 0.25), ("ook", 0.1)]);
    let cache = ModelCache::sig53(Arc::new(StaticLoader::new(logits)));
    cache.load(&DeviceSpec::Cpu).unwrap();

    for top_k in [1, 3, 5, 100] {
        let predictions = cache.classify(&tone_window(256), top_k);
        assert_eq!(predictions.len(), top_k.min(labels.len()));
        assert!(predictions
            .windows(2)
            .all(|pair| pair[0].confidence >= pair[1].confidence));
        assert!(predictions
            .iter()
            .all(|p| (0.0..=1.0).contains(&p.confidence)));
    }

    let top3 = cache.classify(&tone_window(256), 3);
    assert_eq!(top3[0].label, "am-dsb");
    assert_eq!(top3[0].mode.as_deref(), Some("am"));
    assert!((top3[0].confidence - 0.6).abs() < 1e-4);
    assert_eq!(top3[1].label, "fm");
    assert_eq!(top3[1].mode.as_deref(), Some("nfm"));
    assert_eq!(top3[2].label, "ook");
    assert_eq!(top3[2].mode.as_deref(), Some("cw"));
}

#[test]
fn test_all_zero_window_classifies_without_error() {
    let cache = ModelCache::sig53(favoring_am());
    cache.load(&DeviceSpec::Cpu).unwrap();

    let silence = vec![Sample::default(); 1024];
    let predictions = cache.try_classify(&silence, 3).unwrap();

    assert_eq!(predictions.len(), 3);
    assert!(predictions.iter().all(|p| p.confidence.is_finite()));
}

#[test]
fn test_vocabulary_size_mismatch_is_configuration_error() {
    let vocabulary: Vec<String> = (0..53).map(|n| format!("class-{}", n)).collect();
    let modes: HashMap<String, Option<String>> =
        vocabulary.iter().map(|l| (l.clone(), None)).collect();
    let labels = LabelTable::new(vocabulary, modes);

    let loader: Arc<dyn ModelLoader> = Arc::new(StaticLoader::new(vec![0.0; 50]));
    let cache = ModelCache::new(loader, labels).unwrap();

    let err = cache.load(&DeviceSpec::Cpu).unwrap_err();
    assert!(matches!(err, ClassifierError::Configuration(_)));
    assert!(err.is_fatal());
    assert!(!cache.is_loaded());
}

#[test]
fn test_incomplete_mode_table_rejected_at_construction() {
    let labels = LabelTable::from_static(&["ook", "fm"], &[("ook", Some("cw"))]);
    let result = ModelCache::new(favoring_am(), labels);
    assert!(matches!(result, Err(ClassifierError::Configuration(_))));
}

#[test]
fn test_inference_failure_becomes_empty_result() {
    let cache = ModelCache::sig53(Arc::new(BrokenModelLoader::new(53)));
    cache.load(&DeviceSpec::Cpu).unwrap();

    assert!(cache.classify(&tone_window(64), 3).is_empty());
    let err = cache.try_classify(&tone_window(64), 3).unwrap_err();
    assert_eq!(err.kind(), "inference");
}

#[test]
fn test_concurrent_classify_is_serialized() {
    let loader = favoring_am();
    let cache = Arc::new(ModelCache::sig53(loader.clone()));
    cache.load(&DeviceSpec::Cpu).unwrap();

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            thread::spawn(move || {
                (0..25)
                    .map(|_| cache.classify(&tone_window(128), 1))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for worker in workers {
        for predictions in worker.join().unwrap() {
            assert_eq!(predictions.len(), 1);
            assert_eq!(predictions[0].label, "am-dsb");
        }
    }
    assert_eq!(loader.inference_count(), 100);
}

#[test]
fn test_acquire_returns_one_shared_handle() {
    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(|| ModelCache::acquire(favoring_am())))
        .collect();

    let caches: Vec<Arc<ModelCache>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for cache in &caches[1..] {
        assert!(Arc::ptr_eq(&caches[0], cache));
    }
}
