use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use coastal_common::models::HazardReport;

/// Sessions kept at once. The least recently used one is dropped first.
pub const MAX_SESSIONS: usize = 512;

/// The last newest-first report list fetched from the report store for one
/// session.
#[derive(Debug, Clone, Default)]
pub struct ReportSnapshot {
    reports: Vec<HazardReport>,
    loaded_at: Option<DateTime<Utc>>,
    stale: bool,
}

impl ReportSnapshot {
    /// True before the first load and after `mark_stale`.
    pub fn needs_load(&self) -> bool {
        self.loaded_at.is_none() || self.stale
    }

    pub fn replace(&mut self, reports: Vec<HazardReport>) {
        self.reports = reports;
        self.loaded_at = Some(Utc::now());
        self.stale = false;
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    /// The newest `limit` reports.
    pub fn reports(&self, limit: usize) -> Vec<HazardReport> {
        self.reports.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

#[derive(Debug)]
struct Slot<T> {
    value: T,
    last_used: u64,
}

#[derive(Debug)]
struct Slots<T> {
    entries: HashMap<String, Slot<T>>,
    clock: u64,
}

/// Per-session state keyed by bearer token. Nothing stored under one token is
/// ever returned for another.
#[derive(Debug, Clone)]
pub struct SessionMap<T> {
    slots: Arc<RwLock<Slots<T>>>,
    capacity: usize,
}

impl<T> Default for SessionMap<T> {
    fn default() -> Self {
        Self::with_capacity(MAX_SESSIONS)
    }
}

impl<T> SessionMap<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Arc::new(RwLock::new(Slots {
                entries: HashMap::new(),
                clock: 0,
            })),
            capacity: capacity.max(1),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Slots<T>> {
        self.slots.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `f` on the value stored for `token`, creating it first if needed.
    pub fn update<R>(&self, token: &str, f: impl FnOnce(&mut T) -> R) -> R
    where
        T: Default,
    {
        let mut slots = self.write();
        slots.clock += 1;
        let now = slots.clock;

        if !slots.entries.contains_key(token) && slots.entries.len() >= self.capacity {
            let oldest = slots
                .entries
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                slots.entries.remove(&key);
            }
        }

        let slot = slots.entries.entry(token.to_string()).or_insert_with(|| Slot {
            value: T::default(),
            last_used: now,
        });
        slot.last_used = now;
        f(&mut slot.value)
    }

    /// A copy of the value stored for `token`.
    pub fn get(&self, token: &str) -> Option<T>
    where
        T: Clone,
    {
        let mut slots = self.write();
        slots.clock += 1;
        let now = slots.clock;
        slots.entries.get_mut(token).map(|slot| {
            slot.last_used = now;
            slot.value.clone()
        })
    }

    pub fn remove(&self, token: &str) {
        self.write().entries.remove(token);
    }

    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(|e| e.into_inner()).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coastal_common::models::Severity;

    fn sample(id: &str) -> HazardReport {
        serde_json::from_value(crate::test_support::FakeBackend::report_json(
            id,
            Severity::High.as_str(),
            "2026-10-16T05:00:00Z",
        ))
        .unwrap()
    }

    #[test]
    fn test_snapshot_lifecycle() {
        let mut snapshot = ReportSnapshot::default();
        assert!(snapshot.needs_load());
        assert!(snapshot.is_empty());

        snapshot.replace(vec![sample("a"), sample("b"), sample("c")]);
        assert!(!snapshot.needs_load());
        assert!(snapshot.loaded_at().is_some());
        assert_eq!(snapshot.reports(2).len(), 2);
        assert_eq!(snapshot.reports(2)[0].id, "a");

        snapshot.mark_stale();
        assert!(snapshot.needs_load());
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn test_session_map_keeps_tokens_apart() {
        let map: SessionMap<ReportSnapshot> = SessionMap::default();
        map.update("token-a", |s| s.replace(vec![sample("a")]));

        assert_eq!(map.get("token-a").map(|s| s.len()), Some(1));
        assert!(map.get("token-b").is_none());

        map.remove("token-a");
        assert!(map.is_empty());
    }

    #[test]
    fn test_session_map_drops_least_recently_used() {
        let map: SessionMap<u32> = SessionMap::with_capacity(2);
        map.update("a", |v| *v = 1);
        map.update("b", |v| *v = 2);
        map.get("a");
        map.update("c", |v| *v = 3);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a"), Some(1));
        assert_eq!(map.get("b"), None);
        assert_eq!(map.get("c"), Some(3));
    }
}
