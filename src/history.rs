// src/history.rs
//! Durable record of already-delivered article ids.
//!
//! The store is read exactly once per run (snapshot, before ranking) and
//! written at most once (commit, after delivery). The on-disk format is a
//! JSON map keyed by article id, so duplicate records are structurally
//! impossible.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::article::Article;
use crate::error::DigestError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeenRecord {
    pub topic: String,
    pub first_seen: DateTime<Utc>,
}

/// In-memory snapshot of the delivered-id map.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct History {
    #[serde(default)]
    entries: BTreeMap<String, SeenRecord>,
}

impl History {
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, id: &str) -> Option<&SeenRecord> {
        self.entries.get(id)
    }
}

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing or unreadable file yields an empty history: a fresh deploy
    /// has delivered nothing yet.
    pub fn snapshot(&self) -> History {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_default(),
            Err(_) => History::default(),
        }
    }

    /// Append records for newly delivered ids. Existing records keep their
    /// original `first_seen`. Returns how many ids were actually new.
    pub fn commit<'a>(
        &self,
        delivered: impl IntoIterator<Item = (&'a str, &'a str)>,
        at: DateTime<Utc>,
    ) -> Result<usize, DigestError> {
        let mut history = self.snapshot();
        let mut appended = 0usize;
        for (id, topic) in delivered {
            if !history.entries.contains_key(id) {
                history.entries.insert(
                    id.to_string(),
                    SeenRecord {
                        topic: topic.to_string(),
                        first_seen: at,
                    },
                );
                appended += 1;
            }
        }
        self.write_atomic(&history)
            .map_err(|e| DigestError::HistoryCommit(e.to_string()))?;
        debug!(appended, total = history.len(), "history committed");
        Ok(appended)
    }

    fn write_atomic(&self, history: &History) -> Result<(), DigestError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(history)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Keep only candidates whose id is not already in history. Matching is by
/// exact id; titles are never compared.
pub fn filter_new(candidates: Vec<Article>, history: &History) -> Vec<Article> {
    candidates
        .into_iter()
        .filter(|c| !history.contains(&c.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn article(id: &str) -> Article {
        Article {
            id: id.to_string(),
            topic: "semiconductor".into(),
            title: format!("title {id}"),
            source: "Yonhap News".into(),
            url: format!("https://example.test/{id}"),
            published_at: Utc.with_ymd_and_hms(2026, 8, 1, 6, 0, 0).unwrap(),
            excerpt: String::new(),
        }
    }

    #[test]
    fn missing_file_snapshots_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("delivered.json"));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn commit_appends_and_never_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("delivered.json"));
        let t0 = Utc.with_ymd_and_hms(2026, 8, 1, 7, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 8, 2, 7, 0, 0).unwrap();

        let appended = store
            .commit([("a", "semiconductor"), ("b", "macroeconomic")], t0)
            .unwrap();
        assert_eq!(appended, 2);

        // Re-committing a known id appends nothing and keeps first_seen.
        let appended = store
            .commit([("a", "semiconductor"), ("c", "semiconductor")], t1)
            .unwrap();
        assert_eq!(appended, 1);

        let snap = store.snapshot();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.get("a").unwrap().first_seen, t0);
        assert_eq!(snap.get("c").unwrap().first_seen, t1);
    }

    #[test]
    fn filter_new_is_disjoint_from_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("delivered.json"));
        store
            .commit([("a", "semiconductor"), ("c", "semiconductor")], Utc::now())
            .unwrap();

        let history = store.snapshot();
        let fresh = filter_new(vec![article("a"), article("b"), article("c")], &history);
        assert_eq!(fresh.len(), 1);
        assert!(fresh.iter().all(|c| !history.contains(&c.id)));
        assert_eq!(fresh[0].id, "b");
    }
}
