/// Time- and size-bounded in-memory cache for upstream responses.
///
/// ## Policy
///
/// - **Key:** operation name + integer argument tuple, e.g.
///   `("station_sensors", [114])`.
/// - **TTL:** every entry expires a fixed duration after it was stored.
///   Expiry is lazy: a stale entry is treated as absent on lookup and
///   removed then; nothing sweeps in the background.
/// - **Capacity:** when a new key would overflow the cache, expired entries
///   are purged first, then the least-recently-used entry is evicted. Use is
///   tracked with a monotonic counter, so eviction is deterministic.
/// - **Failures are never stored.** `get_or_try_insert_with` only caches
///   `Ok` results; a failing producer is re-invoked on the next call.
///
/// ## Concurrency
///
/// A single `Mutex` guards the map. It is released while the producer runs,
/// so two threads missing on the same key may both call through to the
/// upstream. Both results are valid; the later insert wins.
///
/// Time comes from an injectable `Clock` so TTL behaviour can be tested
/// without sleeping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::trace;

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Keys and entries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub operation: &'static str,
    pub args: Vec<i64>,
}

impl CacheKey {
    pub fn new(operation: &'static str, args: &[i64]) -> Self {
        Self {
            operation,
            args: args.to_vec(),
        }
    }
}

struct Entry<V> {
    value: V,
    /// `None` when the TTL is too large to represent: never expires.
    expires_at: Option<Instant>,
    last_used: u64,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

struct State<V> {
    entries: HashMap<CacheKey, Entry<V>>,
    tick: u64,
}

impl<V> State<V> {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

pub struct TtlCache<V> {
    state: Mutex<State<V>>,
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Creates a cache on the wall clock. A zero capacity is treated as 1.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(State {
                entries: HashMap::new(),
                tick: 0,
            }),
            capacity: capacity.max(1),
            ttl,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<V>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached value for `key` if present and unexpired.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = self.clock.now();
        let mut state = self.lock();
        let tick = state.next_tick();

        let expired = match state.entries.get_mut(key) {
            None => return None,
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => {
                entry.last_used = tick;
                return Some(entry.value.clone());
            }
        };

        if expired {
            trace!(operation = key.operation, args = ?key.args, "cache entry expired");
            state.entries.remove(key);
        }
        None
    }

    /// Stores `value` under `key`, evicting if the cache is full.
    pub fn insert(&self, key: CacheKey, value: V) {
        let now = self.clock.now();
        let expires_at = now.checked_add(self.ttl);
        let mut state = self.lock();
        let tick = state.next_tick();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            state.entries.retain(|_, entry| !entry.is_expired(now));

            if state.entries.len() >= self.capacity {
                let lru = state
                    .entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.last_used)
                    .map(|(k, _)| k.clone());
                if let Some(lru) = lru {
                    trace!(operation = lru.operation, args = ?lru.args, "evicting least recently used");
                    state.entries.remove(&lru);
                }
            }
        }

        state.entries.insert(
            key,
            Entry {
                value,
                expires_at,
                last_used: tick,
            },
        );
    }

    /// Returns the cached value, or runs `producer` and caches its `Ok`
    /// result. Errors are returned to the caller and not stored.
    pub fn get_or_try_insert_with<E, F>(&self, key: CacheKey, producer: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(&key) {
            trace!(operation = key.operation, args = ?key.args, "cache hit");
            return Ok(value);
        }

        trace!(operation = key.operation, args = ?key.args, "cache miss");
        let value = producer()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Drops `key`. Returns whether it was present.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.lock().entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Number of stored entries, including expired ones not yet looked up.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
