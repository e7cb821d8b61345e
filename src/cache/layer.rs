//! Single-flight cache layer keyed by resource identity.

use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

use super::traits::{Pending, SharedFetch};
use crate::error::Result;

/// One cache entry. The generation tells a failing fetch whether the slot
/// it is about to evict is still its own.
struct Slot<V: Clone> {
  generation: u64,
  fetch: SharedFetch<V>,
}

type Slots<K, V> = Mutex<HashMap<K, Slot<V>>>;

/// Keyed store of lazily-created, shared, replay-once computations.
///
/// At most one fetch is in flight per key. A successful result stays cached
/// until the key is evicted; a failed result evicts its own entry so the
/// next access fetches again. There is no expiry.
pub struct SingleFlight<K, V: Clone> {
  /// Name used in log events (e.g. "schema", "label")
  name: &'static str,
  slots: Arc<Slots<K, V>>,
  next_generation: AtomicU64,
}

impl<K, V> SingleFlight<K, V>
where
  K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
  V: Clone + Send + Sync + 'static,
{
  /// Create an empty cache partition.
  pub fn new(name: &'static str) -> Self {
    Self {
      name,
      slots: Arc::new(Mutex::new(HashMap::new())),
      next_generation: AtomicU64::new(0),
    }
  }

  /// Return the cached computation for `key`, or install one built by `factory`.
  ///
  /// The factory's future does not run until the returned handle is first
  /// awaited. Every caller that arrives before it resolves shares it.
  pub fn get_or_fetch<F, Fut>(&self, key: K, factory: F) -> Pending<V>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V>> + Send + 'static,
  {
    let mut slots = self.slots.lock();

    if let Some(slot) = slots.get(&key) {
      debug!(cache = self.name, key = ?key, "cache hit");
      return Pending::from_shared(slot.fetch.clone());
    }

    debug!(cache = self.name, key = ?key, "cache miss, creating entry");
    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
    let fetch = Self::evicting_on_error(
      self.name,
      Arc::downgrade(&self.slots),
      key.clone(),
      generation,
      factory(),
    );

    slots.insert(
      key,
      Slot {
        generation,
        fetch: fetch.clone(),
      },
    );

    Pending::from_shared(fetch)
  }

  /// Install an already-resolved value, replacing any existing entry.
  pub fn insert_ready(&self, key: K, value: V) {
    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
    let fetch = futures::future::ready(Ok(value)).boxed().shared();
    self.slots.lock().insert(key, Slot { generation, fetch });
  }

  /// The cached computation for `key`, if any.
  pub fn get(&self, key: &K) -> Option<Pending<V>> {
    self
      .slots
      .lock()
      .get(key)
      .map(|slot| Pending::from_shared(slot.fetch.clone()))
  }

  /// Drop the entry for `key`. Returns whether an entry existed.
  pub fn evict(&self, key: &K) -> bool {
    let removed = self.slots.lock().remove(key).is_some();
    if removed {
      debug!(cache = self.name, key = ?key, "entry evicted");
    }
    removed
  }

  /// Snapshot of the cached keys.
  pub fn keys(&self) -> Vec<K> {
    self.slots.lock().keys().cloned().collect()
  }

  /// Wrap a fetch so that an `Err` result removes its own slot.
  ///
  /// Holds only a weak reference to the slot map: the future is itself stored
  /// in that map.
  fn evicting_on_error<Fut>(
    name: &'static str,
    slots: Weak<Slots<K, V>>,
    key: K,
    generation: u64,
    fut: Fut,
  ) -> SharedFetch<V>
  where
    Fut: Future<Output = Result<V>> + Send + 'static,
  {
    async move {
      let result = fut.await;
      if let Err(error) = &result {
        if let Some(slots) = slots.upgrade() {
          let mut slots = slots.lock();
          if slots.get(&key).is_some_and(|s| s.generation == generation) {
            slots.remove(&key);
          }
        }
        warn!(cache = name, key = ?key, error = %error, "fetch failed, entry dropped");
      }
      result
    }
    .boxed()
    .shared()
  }
}

impl<K, V: Clone> std::fmt::Debug for SingleFlight<K, V> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SingleFlight")
      .field("name", &self.name)
      .field("entries", &self.slots.lock().len())
      .finish_non_exhaustive()
  }
}
