//! Last-fix cache at ~/.hawkeroute/last_fix.json.
//!
//! Backs two contracts: the `maximum_age` option on position requests (a fix
//! younger than the allowed age is served without touching the platform) and
//! the CLI's offline "last known position" fallback.

use super::types::Position;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// How long a fix stays usable as "last known". A storefront position older
/// than a day says nothing about where the user is now.
const LAST_FIX_TTL_MS: i64 = 24 * 3600 * 1000;

#[derive(Serialize, Deserialize, Clone, Copy)]
struct StoredFix {
    position: Position,
    timestamp_ms: i64,
}

/// The last-fix cache. In-memory, with optional JSON persistence.
pub struct FixCache {
    path: Option<PathBuf>,
    last: Option<StoredFix>,
}

impl FixCache {
    /// A cache that never touches disk.
    pub fn in_memory() -> Self {
        Self { path: None, last: None }
    }

    /// Load from the default location (~/.hawkeroute/last_fix.json).
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load from a specific path (for testing).
    pub fn load_from(path: PathBuf) -> Self {
        let last = Self::read_file(&path);
        Self { path: Some(path), last }
    }

    fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".hawkeroute")
            .join("last_fix.json")
    }

    fn read_file(path: &PathBuf) -> Option<StoredFix> {
        let data = fs::read_to_string(path).ok()?;
        serde_json::from_str(&data).ok()
    }

    /// The last fix, if it is at most `maximum_age` old. A zero age never
    /// serves from cache.
    pub fn fresh(&self, maximum_age: Duration) -> Option<Position> {
        if maximum_age.is_zero() {
            return None;
        }
        let entry = self.last?;
        let age = chrono::Utc::now().timestamp_millis() - entry.timestamp_ms;
        if age <= maximum_age.as_millis() as i64 {
            Some(entry.position)
        } else {
            None
        }
    }

    /// The last fix regardless of request options, if not older than the TTL.
    pub fn last_known(&self) -> Option<Position> {
        let entry = self.last?;
        let age = chrono::Utc::now().timestamp_millis() - entry.timestamp_ms;
        if age <= LAST_FIX_TTL_MS {
            Some(entry.position)
        } else {
            None
        }
    }

    /// Record a fix and persist it when a path is configured.
    pub fn store(&mut self, position: Position) {
        self.last = Some(StoredFix {
            position,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        });
        self.persist();
    }

    fn persist(&self) {
        let (Some(path), Some(entry)) = (&self.path, &self.last) else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Ok(json) = serde_json::to_string_pretty(entry) {
            let _ = fs::write(path, json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fix(lat: f64, lon: f64) -> Position {
        Position::new(lat, lon, 20.0, 0.0, 0.0).unwrap()
    }

    #[test]
    fn test_store_then_fresh() {
        let mut cache = FixCache::in_memory();
        cache.store(fix(1.3521, 103.8198));

        let served = cache.fresh(Duration::from_secs(60)).unwrap();
        assert_eq!(served.latitude, 1.3521);
    }

    #[test]
    fn test_zero_age_never_serves() {
        let mut cache = FixCache::in_memory();
        cache.store(fix(1.0, 2.0));
        assert!(cache.fresh(Duration::ZERO).is_none());
    }

    #[test]
    fn test_stale_entry_ignored() {
        let mut cache = FixCache::in_memory();
        cache.last = Some(StoredFix {
            position: fix(1.0, 2.0),
            timestamp_ms: chrono::Utc::now().timestamp_millis() - 5000,
        });
        assert!(cache.fresh(Duration::from_secs(2)).is_none());
        assert!(cache.fresh(Duration::from_secs(60)).is_some());
    }

    #[test]
    fn test_last_known_ttl() {
        let mut cache = FixCache::in_memory();
        assert!(cache.last_known().is_none());

        cache.store(fix(3.1390, 101.6869));
        assert!(cache.last_known().is_some());

        cache.last = Some(StoredFix {
            position: fix(3.1390, 101.6869),
            timestamp_ms: chrono::Utc::now().timestamp_millis() - LAST_FIX_TTL_MS - 1000,
        });
        assert!(cache.last_known().is_none());
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("last_fix.json");

        {
            let mut cache = FixCache::load_from(path.clone());
            cache.store(fix(59.3293, 18.0686));
        }

        let cache = FixCache::load_from(path);
        let p = cache.last_known().unwrap();
        assert_eq!(p.latitude, 59.3293);
        assert_eq!(p.longitude, 18.0686);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = FixCache::load_from(dir.path().join("nope.json"));
        assert!(cache.last_known().is_none());
    }
}
