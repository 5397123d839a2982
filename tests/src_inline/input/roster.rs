use super::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("splitqc_roster_test_{}_{}", std::process::id(), id));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

const ROSTER: &str = r#"{
    "SQAH": [{"name": "Ann Berg", "bib": 12}, {"name": "Cid Dahl", "bib": "007", "gender": "M"}],
    "SQAF": [{"name": "Eve Falk", "bib": 12, "gender": " F "}, {"name": "Gus Holm", "bib": 30, "inactive": true}],
    "OTHER": []
}"#;

#[test]
fn test_roster_lookup() {
    let roster = Roster::from_json_str(ROSTER).unwrap();
    // Teams are visited in key order, so SQAF claims bib 12 first.
    assert_eq!(roster.display_name("12"), "Eve Falk");
    assert_eq!(roster.team("12"), "SQAF");
    assert_eq!(roster.display_name("7"), "Cid Dahl");
    assert_eq!(roster.display_name("0007"), "Cid Dahl");
    assert_eq!(roster.display_name("30"), UNKNOWN_ATHLETE);
    assert_eq!(roster.team("99"), "");
    assert_eq!(roster.len(), 2);
}

#[test]
fn test_roster_gender_categories() {
    let roster = Roster::from_json_str(ROSTER).unwrap();
    assert_eq!(roster.athlete("12").unwrap().gender.as_deref(), Some("F"));
    assert_eq!(roster.category("12"), Some(Category::Women));
    assert_eq!(roster.category("7"), Some(Category::Men));
    assert_eq!(roster.category("99"), None);

    let blank = Roster::from_json_str(r#"{"T": [{"name": "Ida", "bib": 1, "gender": ""}]}"#).unwrap();
    assert_eq!(blank.athlete("1").unwrap().gender, None);
    assert_eq!(blank.category("1"), None);
}

#[test]
fn test_roster_rejects_bad_json() {
    let err = Roster::from_json_str("[1, 2]").unwrap_err();
    assert!(matches!(err, InputError::Parse(_)));
}

#[test]
fn test_recent_names_moves_duplicate_to_front() {
    let mut recent = RecentNames::default();
    recent.remember("Ann");
    recent.remember("Bea");
    recent.remember("Ann");
    assert_eq!(recent.len(), 2);
    assert_eq!(recent.iter().collect::<Vec<_>>(), vec!["Bea", "Ann"]);
    assert_eq!(recent.iter().last(), Some("Ann"));
}

#[test]
fn test_recent_names_truncates_to_capacity() {
    let mut recent = RecentNames::default();
    for i in 0..=RECENT_NAMES_CAPACITY {
        recent.remember(&format!("Athlete {i}"));
    }
    assert_eq!(recent.len(), RECENT_NAMES_CAPACITY);
    assert_eq!(recent.iter().next(), Some("Athlete 1"));
    assert_eq!(
        recent.iter().last().map(str::to_string),
        Some(format!("Athlete {RECENT_NAMES_CAPACITY}"))
    );
}

#[test]
fn test_recent_names_suggest() {
    let recent = RecentNames::from_names(["Anna", "bert", "Annika", " ", "Bo"]);
    assert_eq!(recent.suggest("an"), vec!["Annika", "Anna"]);
    assert_eq!(recent.suggest("B"), vec!["Bo", "bert"]);
    assert!(recent.suggest("").is_empty());
    assert_eq!(recent.len(), 4);
}

#[test]
fn test_recent_names_missing_file_starts_empty() {
    let dir = make_temp_dir();
    let recent = RecentNames::load(&dir.join("recent_names.json")).unwrap();
    assert!(recent.is_empty());
}

#[test]
fn test_recent_names_persist_in_order() {
    let dir = make_temp_dir();
    let path = dir.join("recent_names.json");
    let mut recent = RecentNames::from_names(["Anna", "Bo"]);
    recent.remember("Anna");
    recent.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let raw: Vec<String> = serde_json::from_str(&text).unwrap();
    assert_eq!(raw, vec!["Bo", "Anna"]);

    let loaded = RecentNames::load(&path).unwrap();
    assert_eq!(loaded.iter().collect::<Vec<_>>(), vec!["Bo", "Anna"]);
    assert_eq!(loaded.suggest("a"), vec!["Anna"]);
}

#[test]
fn test_recent_names_rejects_bad_file() {
    let dir = make_temp_dir();
    let path = dir.join("recent_names.json");
    std::fs::write(&path, "{\"names\": 1}").unwrap();
    assert!(matches!(RecentNames::load(&path), Err(InputError::Parse(_))));
}

#[test]
fn test_remember_bibs_resolves_through_roster() {
    let roster = Roster::from_json_str(ROSTER).unwrap();
    let mut recent = RecentNames::from_names(["Eve Falk", "Old Name"]);
    let remembered = recent.remember_bibs(["12", "99", "007", "12"], &roster);
    assert_eq!(remembered, 3);
    assert_eq!(
        recent.iter().collect::<Vec<_>>(),
        vec!["Old Name", "Cid Dahl", "Eve Falk"]
    );
}
