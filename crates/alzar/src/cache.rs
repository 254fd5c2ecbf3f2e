use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

struct Entry<T> {
  value: T,
  loaded_at: Instant,
}

/// Memoizes one value for a fixed time-to-live.
///
/// Concurrent callers that find the entry stale wait on the same lock, so a
/// refresh runs at most once at a time.
pub struct TtlCache<T> {
  ttl: Duration,
  entry: Mutex<Option<Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
  pub fn new(ttl: Duration) -> Self {
    Self { ttl, entry: Mutex::new(None) }
  }

  pub fn ttl(&self) -> Duration {
    self.ttl
  }

  /// Return the cached value while it is fresh, otherwise run `load` and
  /// cache its result. Errors are returned as-is and nothing is cached.
  pub async fn get_or_refresh<F, Fut, E>(&self, load: F) -> Result<T, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    let mut entry = self.entry.lock().await;

    if let Some(cached) = entry.as_ref() {
      if cached.loaded_at.elapsed() < self.ttl {
        return Ok(cached.value.clone());
      }
      tracing::debug!("cache entry expired");
    }

    let value = load().await?;
    *entry = Some(Entry { value: value.clone(), loaded_at: Instant::now() });
    Ok(value)
  }

  /// Drop the cached value so the next read reloads
  pub async fn invalidate(&self) {
    *self.entry.lock().await = None;
  }
}
