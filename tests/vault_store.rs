use chrono::NaiveDate;
use tempfile::tempdir;

use flowcast::models::{
    FlowIntensity, InsightCategory, InsightKind, Mood, NewInsight, PreferencesUpdate, Priority,
};
use flowcast::phase::CurrentPhase;
use flowcast::storage::{EntryStore, InsightStore, PredictionStore, ProfileStore, StoreError};
use flowcast::vault;
use flowcast::{CheckIn, Tracker, VaultStore};

fn ymd(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

fn period_day(date: NaiveDate) -> CheckIn {
    CheckIn {
        date,
        flow_intensity: FlowIntensity::Medium,
        mood: Mood::Sad,
        symptoms: Vec::new(),
        notes: String::new(),
    }
}

#[test]
fn records_persist_across_reopen() {
    let dir = tempdir().unwrap();
    let path = vault::path_in(dir.path());

    let prediction = {
        let tracker = Tracker::new(VaultStore::open(&path, "hunter2").unwrap());
        tracker.check_in(period_day(ymd(1, 1))).unwrap();
        tracker
            .check_in(period_day(ymd(1, 2)))
            .unwrap()
            .prediction
            .unwrap()
    };
    assert!(path.exists());

    let store = VaultStore::open(&path, "hunter2").unwrap();
    assert_eq!(store.all().unwrap().len(), 2);
    assert_eq!(store.current().unwrap(), Some(prediction));
    assert_eq!(store.profile().unwrap().last_period_start, ymd(1, 1));
}

#[test]
fn wrong_passphrase_is_rejected_on_open() {
    let dir = tempdir().unwrap();
    let path = vault::path_in(dir.path());

    let store = VaultStore::open(&path, "right").unwrap();
    store
        .update_preferences(PreferencesUpdate {
            insights: Some(false),
            ..Default::default()
        })
        .unwrap();

    let err = VaultStore::open(&path, "wrong").unwrap_err();
    assert!(matches!(err, StoreError::Crypto(_)));
}

#[test]
fn vault_file_is_not_plaintext() {
    let dir = tempdir().unwrap();
    let path = vault::path_in(dir.path());
    let tracker = Tracker::new(VaultStore::open(&path, "secret").unwrap());
    let mut check_in = period_day(ymd(3, 3));
    check_in.notes = "very private note".into();
    tracker.check_in(check_in).unwrap();

    let raw = std::fs::read(&path).unwrap();
    let needle = b"very private note";
    assert!(!raw.windows(needle.len()).any(|w| w == needle));
}

#[test]
fn wipe_removes_file() {
    let dir = tempdir().unwrap();
    let path = vault::path_in(dir.path());
    let store = VaultStore::open(&path, "pw").unwrap();
    store.profile().unwrap();
    assert!(path.exists());

    store.wipe().unwrap();
    assert!(!path.exists());
}

#[test]
fn insights_persist_with_viewed_flag() {
    let dir = tempdir().unwrap();
    let path = vault::path_in(dir.path());

    let tracker = Tracker::new(VaultStore::open(&path, "pw").unwrap());
    let added = tracker
        .add_insight(NewInsight {
            kind: InsightKind::Pattern,
            category: InsightCategory::Mood,
            message: "Lower mood two days before each period".into(),
            phase: Some(CurrentPhase::Luteal),
            priority: Priority::High,
        })
        .unwrap();
    tracker.mark_insight_viewed(added.id).unwrap();

    let store = tracker.into_store();
    assert_eq!(store.path(), path.as_path());
    drop(store);

    let reopened = VaultStore::open(&path, "pw").unwrap();
    let insights = reopened.all_insights().unwrap();
    assert_eq!(insights.len(), 1);
    assert_eq!(insights[0].id, added.id);
    assert!(insights[0].viewed);
    assert!(reopened.unviewed_insights().unwrap().is_empty());
    assert_eq!(reopened.insights_in_phase(CurrentPhase::Luteal).unwrap().len(), 1);
}
