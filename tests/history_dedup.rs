// tests/history_dedup.rs
use std::collections::HashSet;

use chrono::{TimeZone, Utc};
use semicon_news_digest::article::Article;
use semicon_news_digest::history::{filter_new, HistoryStore};

fn article(id: &str, topic: &str) -> Article {
    Article {
        id: id.to_string(),
        topic: topic.to_string(),
        title: format!("title {id}"),
        source: "Yonhap News".into(),
        url: format!("https://example.test/{id}"),
        published_at: Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap(),
        excerpt: String::new(),
    }
}

#[test]
fn history_never_holds_duplicate_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path().join("delivered.json"));
    let now = Utc::now();

    store
        .commit([("a", "semiconductor"), ("b", "macroeconomic")], now)
        .unwrap();
    store
        .commit([("b", "macroeconomic"), ("c", "semiconductor")], now)
        .unwrap();

    let snap = store.snapshot();
    let ids: Vec<&str> = snap.ids().collect();
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len());
    assert_eq!(snap.len(), 3);
}

#[test]
fn filtered_candidates_are_disjoint_from_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path().join("delivered.json"));
    store
        .commit(
            [("a", "semiconductor"), ("c", "semiconductor"), ("e", "macroeconomic")],
            Utc::now(),
        )
        .unwrap();

    let history = store.snapshot();
    let candidates = vec![
        article("a", "semiconductor"),
        article("b", "semiconductor"),
        article("c", "semiconductor"),
        article("d", "macroeconomic"),
        article("e", "macroeconomic"),
    ];
    let fresh = filter_new(candidates, &history);

    let fresh_ids: HashSet<&str> = fresh.iter().map(|a| a.id.as_str()).collect();
    let history_ids: HashSet<&str> = history.ids().collect();
    assert!(fresh_ids.is_disjoint(&history_ids));
    assert_eq!(fresh_ids, HashSet::from(["b", "d"]));
}

#[test]
fn commit_survives_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("delivered.json");
    {
        let store = HistoryStore::new(&path);
        store.commit([("a", "semiconductor")], Utc::now()).unwrap();
    }
    // a brand-new store over the same file sees the record
    let store = HistoryStore::new(&path);
    assert!(store.snapshot().contains("a"));
}

#[test]
fn empty_commit_still_writes_a_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("delivered.json");
    let store = HistoryStore::new(&path);
    let appended = store
        .commit(std::iter::empty::<(&str, &str)>(), Utc::now())
        .unwrap();
    assert_eq!(appended, 0);
    assert!(path.exists());
    assert!(store.snapshot().is_empty());
}
