use signaltab::model::{LabelTable, SIG53_CLASSES};
use signaltab::ClassifierError;

#[test]
fn test_label_of_out_of_bounds_is_configuration_error() {
    let table = LabelTable::sig53();
    let err = table.label_of(SIG53_CLASSES.len()).unwrap_err();
    assert!(matches!(err, ClassifierError::Configuration(_)));
}

#[test]
fn test_common_mode_mappings() {
    let table = LabelTable::sig53();
    assert_eq!(table.mode_of("am-dsb"), Some("am"));
    assert_eq!(table.mode_of("am-usb"), Some("usb"));
    assert_eq!(table.mode_of("am-lsb"), Some("lsb"));
    assert_eq!(table.mode_of("fm"), Some("nfm"));
    assert_eq!(table.mode_of("ook"), Some("cw"));
    assert_eq!(table.mode_of("gmsk"), Some("dstar"));
    assert_eq!(table.mode_of("ofdm-2048"), Some("dab"));
}

#[test]
fn test_unsupported_classes_have_no_mode() {
    let table = LabelTable::sig53();
    assert_eq!(table.mode_of("256qam"), None);
    assert_eq!(table.mode_of("chirp_ss"), None);
    assert_eq!(table.mode_of("not-a-class"), None);
}

#[test]
fn test_mode_of_is_deterministic() {
    let table = LabelTable::sig53();
    for label in table.labels() {
        let first = table.mode_of(label).map(str::to_string);
        for _ in 0..10 {
            assert_eq!(table.mode_of(label).map(str::to_string), first);
        }
    }
}

#[test]
fn test_every_label_has_mode_entry() {
    let table = LabelTable::sig53();
    assert!(table.validate().is_ok());
}

#[test]
fn test_missing_mode_entry_fails_validation() {
    let table = LabelTable::from_static(&["ook", "fm"], &[("ook", Some("cw"))]);
    let err = table.validate().unwrap_err();
    assert!(err.to_string().contains("fm"));
}

#[test]
fn test_duplicate_label_fails_validation() {
    let table = LabelTable::from_static(&["ook", "ook"], &[("ook", Some("cw"))]);
    assert!(table.validate().is_err());
}

#[test]
fn test_capability_size_must_match() {
    let table = LabelTable::sig53();
    assert!(table.validate_against(53).is_ok());
    assert!(table.validate_against(50).is_err());
}
