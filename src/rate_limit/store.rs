use crate::errors::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Outcome of one admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Admitted; `count` includes this request
    Allowed { count: u32, limit: u32 },
    /// Rejected; the window resets in `retry_after` whole seconds
    Denied { retry_after: u64 },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

/// Backing store for fixed-window counters.
///
/// Implementations must perform the read-decide-write of [`RateLimitStore::hit`]
/// atomically per key.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count one request against `key`, admitting it if the window still has room
    async fn hit(&self, key: &str, limit: u32, window: Duration) -> Result<Admission>;

    /// Number of live keys
    async fn len(&self) -> Result<usize>;

    fn backend(&self) -> &'static str;
}

/// Per-key throttling state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindowEntry {
    pub window_start: Instant,
    /// Admitted requests since `window_start`, always >= 1
    pub count: u32,
}

impl RateWindowEntry {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            count: 1,
        }
    }

    fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.window_start)
    }

    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        self.elapsed(now) >= window
    }
}

/// Process-local store. Counters are lost on restart and not shared
/// between processes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, RateWindowEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed-window admission at an explicit instant.
    ///
    /// Every call first sweeps expired entries, so the cost is linear in
    /// the number of live keys.
    pub fn hit_at(&self, key: &str, limit: u32, window: Duration, now: Instant) -> Admission {
        let mut entries = self.entries.lock();

        entries.retain(|_, entry| !entry.is_expired(now, window));

        let Some(entry) = entries.get_mut(key) else {
            entries.insert(key.to_string(), RateWindowEntry::new(now));
            return Admission::Allowed { count: 1, limit };
        };

        // Rollover wins over the count check
        if entry.is_expired(now, window) {
            *entry = RateWindowEntry::new(now);
            return Admission::Allowed { count: 1, limit };
        }

        if entry.count >= limit {
            let retry_after = window.saturating_sub(entry.elapsed(now)).as_secs();
            return Admission::Denied { retry_after };
        }

        entry.count += 1;
        Admission::Allowed {
            count: entry.count,
            limit,
        }
    }

    /// Current state for `key`, if any
    pub fn entry(&self, key: &str) -> Option<RateWindowEntry> {
        self.entries.lock().get(key).copied()
    }

    pub fn reset(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    pub fn live_keys(&self) -> usize {
        self.entries.lock().len()
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn hit(&self, key: &str, limit: u32, window: Duration) -> Result<Admission> {
        Ok(self.hit_at(key, limit, window, Instant::now()))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.live_keys())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    fn at(t0: Instant, secs: u64) -> Instant {
        t0 + Duration::from_secs(secs)
    }

    #[test]
    fn test_worked_example() {
        let store = MemoryStore::new();
        let key = "ip:1.2.3.4:path:/x";
        let t0 = Instant::now();

        assert_eq!(
            store.hit_at(key, 2, WINDOW, at(t0, 0)),
            Admission::Allowed { count: 1, limit: 2 }
        );
        assert_eq!(
            store.hit_at(key, 2, WINDOW, at(t0, 10)),
            Admission::Allowed { count: 2, limit: 2 }
        );
        assert_eq!(
            store.hit_at(key, 2, WINDOW, at(t0, 20)),
            Admission::Denied { retry_after: 40 }
        );
        assert_eq!(
            store.hit_at(key, 2, WINDOW, at(t0, 61)),
            Admission::Allowed { count: 1, limit: 2 }
        );
    }

    #[test]
    fn test_admits_up_to_limit_then_denies() {
        let store = MemoryStore::new();
        let t0 = Instant::now();

        for i in 1..=5 {
            let admission = store.hit_at("k", 5, WINDOW, at(t0, i));
            assert!(admission.is_allowed(), "request {} should be admitted", i);
        }

        assert!(!store.hit_at("k", 5, WINDOW, at(t0, 6)).is_allowed());
    }

    #[test]
    fn test_rollover_exactly_at_window_boundary() {
        let store = MemoryStore::new();
        let t0 = Instant::now();

        store.hit_at("k", 1, WINDOW, t0);
        assert!(!store.hit_at("k", 1, WINDOW, at(t0, 59)).is_allowed());

        let admission = store.hit_at("k", 1, WINDOW, at(t0, 60));
        assert_eq!(admission, Admission::Allowed { count: 1, limit: 1 });
        assert_eq!(store.entry("k").unwrap().window_start, at(t0, 60));
    }

    #[test]
    fn test_denial_does_not_mutate() {
        let store = MemoryStore::new();
        let t0 = Instant::now();

        store.hit_at("k", 1, WINDOW, t0);
        let before = store.entry("k").unwrap();

        for secs in [1, 2, 3] {
            store.hit_at("k", 1, WINDOW, at(t0, secs));
        }

        assert_eq!(store.entry("k").unwrap(), before);
    }

    #[test]
    fn test_retry_after_truncates() {
        let store = MemoryStore::new();
        let t0 = Instant::now();

        store.hit_at("k", 1, WINDOW, t0);
        let denied = store.hit_at("k", 1, WINDOW, t0 + Duration::from_millis(20_500));
        assert_eq!(denied, Admission::Denied { retry_after: 39 });

        let denied = store.hit_at("k", 1, WINDOW, t0 + Duration::from_millis(59_999));
        assert_eq!(denied, Admission::Denied { retry_after: 0 });
    }

    #[test]
    fn test_keys_are_isolated() {
        let store = MemoryStore::new();
        let t0 = Instant::now();

        store.hit_at("a", 1, WINDOW, t0);
        assert!(!store.hit_at("a", 1, WINDOW, at(t0, 1)).is_allowed());
        assert!(store.hit_at("b", 1, WINDOW, at(t0, 1)).is_allowed());
    }

    #[test]
    fn test_sweep_removes_expired_entries() {
        let store = MemoryStore::new();
        let t0 = Instant::now();

        store.hit_at("old", 10, WINDOW, t0);
        store.hit_at("fresh", 10, WINDOW, at(t0, 30));
        assert_eq!(store.live_keys(), 2);

        // Touching any key sweeps "old"
        store.hit_at("fresh", 10, WINDOW, at(t0, 70));
        assert_eq!(store.live_keys(), 1);
        assert!(store.entry("old").is_none());

        assert_eq!(
            store.hit_at("old", 10, WINDOW, at(t0, 71)),
            Admission::Allowed { count: 1, limit: 10 }
        );
    }

    #[test]
    fn test_reset_clears_key() {
        let store = MemoryStore::new();
        let t0 = Instant::now();

        store.hit_at("k", 1, WINDOW, t0);
        store.reset("k");
        assert!(store.hit_at("k", 1, WINDOW, at(t0, 1)).is_allowed());
    }

    #[tokio::test]
    async fn test_store_trait_uses_wall_clock() {
        let store = MemoryStore::new();

        assert!(store.hit("k", 2, WINDOW).await.unwrap().is_allowed());
        assert!(store.hit("k", 2, WINDOW).await.unwrap().is_allowed());
        assert!(matches!(
            store.hit("k", 2, WINDOW).await.unwrap(),
            Admission::Denied { retry_after } if retry_after <= 60
        ));
        assert_eq!(store.len().await.unwrap(), 1);
    }
}
