//! In-memory pending storage with TTL expiration.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Entry in the pending store with expiration tracking.
struct PendingEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> PendingEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory key/value store whose entries expire after a fixed TTL.
///
/// Expired entries are never returned. A read that touches an expired
/// entry removes it, and [`PendingStore::spawn_sweeper`] removes the rest
/// in the background.
pub struct PendingStore<K, V> {
    entries: Arc<RwLock<HashMap<K, PendingEntry<V>>>>,
    ttl: Duration,
}

impl<K, V> Clone for PendingStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl: self.ttl,
        }
    }
}

impl<K, V> fmt::Debug for PendingStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl<K, V> PendingStore<K, V>
where
    K: Eq + Hash,
{
    /// Create an empty store. Every entry lives for `ttl` after insertion.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Lifetime given to each inserted entry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert a value, replacing any entry under the same key.
    ///
    /// Returns the replaced value if it had not yet expired.
    pub async fn insert(&self, key: K, value: V) -> Option<V> {
        let now = Instant::now();
        self.insert_at(key, value, expiry(now, self.ttl), now).await
    }

    /// Insert a value that expires at `expires_at` instead of after the TTL.
    ///
    /// Pairs with [`PendingStore::remove_entry`] to put a value back without
    /// extending its lifetime.
    pub async fn insert_until(&self, key: K, value: V, expires_at: Instant) -> Option<V> {
        self.insert_at(key, value, expires_at, Instant::now()).await
    }

    async fn insert_at(&self, key: K, value: V, expires_at: Instant, now: Instant) -> Option<V> {
        let entry = PendingEntry { value, expires_at };

        let mut entries = self.entries.write().await;
        entries
            .insert(key, entry)
            .filter(|previous| previous.is_live(now))
            .map(|previous| previous.value)
    }

    /// Get a copy of a live value.
    pub async fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
        V: Clone,
    {
        let mut entries = self.entries.write().await;
        live_entry(&mut entries, key, Instant::now()).map(|entry| entry.value.clone())
    }

    /// Apply `f` to a live value in place.
    ///
    /// Returns `None` without calling `f` when the key is absent or expired.
    pub async fn update<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
        F: FnOnce(&mut V) -> R,
    {
        let mut entries = self.entries.write().await;
        live_entry(&mut entries, key, Instant::now()).map(|entry| f(&mut entry.value))
    }

    /// Remove a value, returning it only if it had not yet expired.
    pub async fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries
            .remove(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value)
    }

    /// Remove a live value together with the instant it would have expired.
    pub async fn remove_entry<Q>(&self, key: &Q) -> Option<(V, Instant)>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries
            .remove(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| (entry.value, entry.expires_at))
    }

    /// Check whether a live entry exists for `key`.
    pub async fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let entries = self.entries.read().await;
        let now = Instant::now();
        entries.get(key).is_some_and(|entry| entry.is_live(now))
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        let now = Instant::now();
        entries.values().filter(|entry| entry.is_live(now)).count()
    }

    /// Whether the store holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();

        entries.retain(|_, entry| entry.is_live(now));

        before - entries.len()
    }
}

impl<K, V> PendingStore<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Spawn a background task that sweeps expired entries every `interval`.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();

        info!(ttl = ?self.ttl, ?interval, "Starting pending store sweeper");

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                let removed = store.sweep().await;
                if removed > 0 {
                    debug!("Swept {} expired pending entries", removed);
                }
            }
        })
    }
}

/// Longest lifetime an entry can get; larger TTLs are clamped to it.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Expiry instant for an entry inserted at `now`, saturating on overflow.
fn expiry(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(MAX_TTL))
        .unwrap_or(now)
}

/// Look up a live entry, evicting it first if it has expired.
fn live_entry<'a, K, V, Q>(
    entries: &'a mut HashMap<K, PendingEntry<V>>,
    key: &Q,
    now: Instant,
) -> Option<&'a mut PendingEntry<V>>
where
    K: Eq + Hash + Borrow<Q>,
    Q: Eq + Hash + ?Sized,
{
    let expired = entries.get(key).is_some_and(|entry| !entry.is_live(now));
    if expired {
        entries.remove(key);
        debug!("Evicted expired pending entry on read");
        return None;
    }

    entries.get_mut(key)
}
