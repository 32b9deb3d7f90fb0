//! In-memory user cache with write-through persistence.
//!
//! The cache is the single authority for live user records. Reads go
//! through it (loading from the store on a miss), day rollover happens
//! lazily on access, and updates merge a [`RecordPatch`] into the cached
//! record before optionally persisting the merged result.
//!
//! One coarse async mutex guards the whole map. Persisting while the
//! lock is held serializes all users behind a disk write, which is an
//! accepted cost at this bot's scale in exchange for never exposing a
//! half-merged record.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::StoreResult;
use crate::record::{RecordPatch, UserRecord, rollover};
use crate::user_store::UserStore;

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// Cache hit/miss counters, updated without the map lock.
#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// A snapshot of cache activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Write-through cache of [`UserRecord`]s keyed by Telegram user id.
pub struct UserCache {
    store: UserStore,
    users: Mutex<HashMap<i64, UserRecord>>,
    counters: Counters,
}

impl UserCache {
    pub fn new(store: UserStore) -> Self {
        Self {
            store,
            users: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    // ── reads ────────────────────────────────────────────────────────

    /// Fetch the live record for `user_id`, loading it from the store on
    /// a miss. `Ok(None)` means the user is unknown everywhere, which is
    /// how the engine detects someone who has never run setup.
    ///
    /// Applies day rollover before returning, so callers always see
    /// totals that belong to today. The rollover itself is memory-only;
    /// it reaches disk with the next persisted update.
    pub async fn get(&self, user_id: i64) -> StoreResult<Option<UserRecord>> {
        self.get_at(user_id, Utc::now().date_naive()).await
    }

    /// [`get`](Self::get) with an injected "today" for tests.
    #[instrument(skip(self))]
    pub async fn get_at(&self, user_id: i64, today: NaiveDate) -> StoreResult<Option<UserRecord>> {
        let mut users = self.users.lock().await;

        if !users.contains_key(&user_id) {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            match self.store.load(user_id).await? {
                Some(record) => {
                    users.insert(user_id, record);
                }
                None => return Ok(None),
            }
        } else {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
        }

        // Entry is guaranteed present here.
        let Some(record) = users.get_mut(&user_id) else {
            return Ok(None);
        };
        if rollover(record, today) {
            debug!(user_id, %today, "rolled daily totals over");
        }
        record.last_active = Utc::now();
        Ok(Some(record.clone()))
    }

    // ── writes ───────────────────────────────────────────────────────

    /// Insert a record into memory without touching the store.
    ///
    /// Used when a brand-new user starts setup: nothing durable exists
    /// until the first persisted update.
    pub async fn add(&self, user_id: i64, record: UserRecord) {
        let mut users = self.users.lock().await;
        users.insert(user_id, record);
    }

    /// Merge `patch` into the cached record and return the result.
    ///
    /// Loads the record through the cache first; if the user is unknown
    /// everywhere a blank shell is synthesized, which normally means an
    /// upstream sequencing bug, hence the warning. Stamps `last_active`,
    /// and when `persist` is set writes the merged record through to the
    /// store before returning.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        user_id: i64,
        patch: RecordPatch,
        persist: bool,
    ) -> StoreResult<UserRecord> {
        self.update_at(user_id, patch, persist, Utc::now().date_naive())
            .await
    }

    /// [`update`](Self::update) with an injected "today" for tests.
    pub async fn update_at(
        &self,
        user_id: i64,
        patch: RecordPatch,
        persist: bool,
        today: NaiveDate,
    ) -> StoreResult<UserRecord> {
        let mut users = self.users.lock().await;

        if !users.contains_key(&user_id) {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            let record = match self.store.load(user_id).await? {
                Some(record) => record,
                None => {
                    warn!(user_id, "update for unknown user, starting from a blank record");
                    UserRecord::default()
                }
            };
            users.insert(user_id, record);
        } else {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
        }

        let Some(record) = users.get_mut(&user_id) else {
            return Err(crate::error::StoreError::NotFound {
                entity: "user",
                id: user_id,
            });
        };
        rollover(record, today);
        patch.apply(record);
        record.current_date = Some(today);
        record.last_active = Utc::now();
        let merged = record.clone();

        if persist {
            self.store.save(user_id, &merged).await?;
        }
        Ok(merged)
    }

    // ── eviction ─────────────────────────────────────────────────────

    /// Drop entries idle for longer than `max_idle`. Returns how many
    /// were evicted. Evicted state is already durable (or was never
    /// meant to be), so nothing is written here.
    pub async fn remove_inactive(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(max_idle).unwrap_or(chrono::Duration::hours(24));
        let mut users = self.users.lock().await;
        let before = users.len();
        users.retain(|_, record| record.last_active > cutoff);
        let evicted = before - users.len();
        if evicted > 0 {
            info!(evicted, remaining = users.len(), "evicted idle users");
        }
        evicted
    }

    /// Current hit/miss counters and entry count.
    pub async fn stats(&self) -> CacheStats {
        let users = self.users.lock().await;
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            entries: users.len(),
        }
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::record::Gender;

    async fn setup_cache() -> UserCache {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        UserCache::new(UserStore::new(db))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn get_unknown_user_is_none() {
        let cache = setup_cache().await;
        assert!(cache.get(42).await.unwrap().is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn second_get_is_a_hit() {
        let cache = setup_cache().await;
        cache.add(42, UserRecord::default()).await;
        cache.get(42).await.unwrap();
        cache.get(42).await.unwrap();

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn miss_loads_through_from_store() {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        let store = UserStore::new(db);

        let stored = UserRecord {
            weight: 70.0,
            gender: Gender::Female,
            water_goal: 2600.0,
            calorie_goal: 2189.0,
            current_date: Some(Utc::now().date_naive()),
            ..UserRecord::default()
        };
        store.save(42, &stored).await.unwrap();

        let cache = UserCache::new(store);
        let record = cache.get(42).await.unwrap().unwrap();
        assert_eq!(record.weight, 70.0);
        assert_eq!(record.gender, Gender::Female);
        assert!(record.profile_complete());
    }

    #[tokio::test]
    async fn get_rolls_over_stale_totals() {
        let cache = setup_cache().await;
        cache
            .update_at(
                42,
                RecordPatch {
                    logged_water: Some(900.0),
                    ..RecordPatch::default()
                },
                false,
                date(2025, 3, 1),
            )
            .await
            .unwrap();

        let record = cache.get_at(42, date(2025, 3, 2)).await.unwrap().unwrap();
        assert_eq!(record.logged_water, 0.0);
        assert_eq!(record.current_date, Some(date(2025, 3, 2)));
    }

    #[tokio::test]
    async fn update_without_persist_stays_in_memory() {
        let cache = setup_cache().await;
        cache
            .update(
                42,
                RecordPatch {
                    weight: Some(80.0),
                    ..RecordPatch::default()
                },
                false,
            )
            .await
            .unwrap();

        // Nothing durable was written.
        assert!(cache.store.load(42).await.unwrap().is_none());

        let record = cache.get(42).await.unwrap().unwrap();
        assert_eq!(record.weight, 80.0);
    }

    #[tokio::test]
    async fn update_with_persist_writes_through() {
        let cache = setup_cache().await;
        cache
            .update(
                42,
                RecordPatch {
                    weight: Some(80.0),
                    water_goal: Some(2600.0),
                    ..RecordPatch::default()
                },
                true,
            )
            .await
            .unwrap();

        let stored = cache.store.load(42).await.unwrap().unwrap();
        assert_eq!(stored.weight, 80.0);
        assert_eq!(stored.water_goal, 2600.0);
    }

    #[tokio::test]
    async fn update_rolls_over_before_merging() {
        let cache = setup_cache().await;
        cache
            .update_at(
                42,
                RecordPatch {
                    logged_water: Some(900.0),
                    ..RecordPatch::default()
                },
                false,
                date(2025, 3, 1),
            )
            .await
            .unwrap();

        // Next day: the patch applies to zeroed totals.
        let record = cache
            .update_at(
                42,
                RecordPatch {
                    logged_water: Some(250.0),
                    ..RecordPatch::default()
                },
                false,
                date(2025, 3, 2),
            )
            .await
            .unwrap();
        assert_eq!(record.logged_water, 250.0);
    }

    #[tokio::test]
    async fn update_stamps_current_date() {
        let cache = setup_cache().await;
        let record = cache
            .update_at(42, RecordPatch::default(), false, date(2025, 3, 1))
            .await
            .unwrap();
        assert_eq!(record.current_date, Some(date(2025, 3, 1)));
    }

    #[tokio::test]
    async fn add_is_memory_only() {
        let cache = setup_cache().await;
        cache.add(42, UserRecord::default()).await;

        assert!(cache.store.load(42).await.unwrap().is_none());
        assert_eq!(cache.stats().await.entries, 1);
    }

    #[tokio::test]
    async fn remove_inactive_evicts_idle_entries() {
        let cache = setup_cache().await;
        cache.add(1, UserRecord::default()).await;
        cache.add(2, UserRecord::default()).await;

        // Backdate one entry past the idle cutoff.
        {
            let mut users = cache.users.lock().await;
            users.get_mut(&1).unwrap().last_active = Utc::now() - chrono::Duration::hours(48);
        }

        let evicted = cache.remove_inactive(Duration::from_secs(24 * 3600)).await;
        assert_eq!(evicted, 1);
        assert_eq!(cache.stats().await.entries, 1);
    }

    #[tokio::test]
    async fn remove_inactive_keeps_fresh_entries() {
        let cache = setup_cache().await;
        cache.add(1, UserRecord::default()).await;

        let evicted = cache.remove_inactive(Duration::from_secs(3600)).await;
        assert_eq!(evicted, 0);
        assert_eq!(cache.stats().await.entries, 1);
    }
}
