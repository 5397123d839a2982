use super::*;

#[test]
fn test_status_tokens() {
    assert_eq!(EntryStatus::from_token(""), Some(EntryStatus::Valid));
    assert_eq!(EntryStatus::from_token(" dnf "), Some(EntryStatus::Dnf));
    assert_eq!(EntryStatus::from_token("Dsq"), Some(EntryStatus::Dsq));
    assert_eq!(EntryStatus::from_token("DNS"), Some(EntryStatus::Dns));
    assert_eq!(EntryStatus::from_token("err"), Some(EntryStatus::Err));
    assert_eq!(EntryStatus::from_token("LAP"), None);
}

#[test]
fn test_status_contributions() {
    assert!(EntryStatus::Dnf.contributes_splits());
    assert!(!EntryStatus::Dnf.contributes_finish());
    assert!(!EntryStatus::Dns.contributes_splits());
    assert!(!EntryStatus::Err.contributes_splits());
    assert!(EntryStatus::Valid.contributes_finish());
}

#[test]
fn test_normalize_bib() {
    assert_eq!(normalize_bib(" 007 "), "7");
    assert_eq!(normalize_bib("000"), "0");
    assert_eq!(normalize_bib("A12"), "A12");
}

#[test]
fn test_recorded_filters_zero() {
    assert_eq!(recorded(Some(0.0)), None);
    assert_eq!(recorded(None), None);
    assert_eq!(recorded(Some(12.5)), Some(12.5));
}

#[test]
fn test_entry_value_by_column() {
    let entry = RunEntry::new("4", vec![Some(10.0), None], Some(30.0));
    assert_eq!(entry.value(Column::Split(0)), Some(10.0));
    assert_eq!(entry.value(Column::Split(1)), None);
    assert_eq!(entry.value(Column::Split(7)), None);
    assert_eq!(entry.value(Column::Finish), Some(30.0));
    assert!(entry.has_any_time());
    assert!(!RunEntry::new("5", vec![None], Some(0.0)).has_any_time());
}
