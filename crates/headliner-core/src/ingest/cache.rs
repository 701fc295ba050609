use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::news::{ArticleRecord, FetchParams};

struct Entry {
    inserted_at: Instant,
    articles: Vec<ArticleRecord>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<FetchParams, Entry>,
    // Insertion order, oldest first; may hold keys already replaced or expired
    order: VecDeque<FetchParams>,
}

/// Bounded, time-limited memo of upstream headline fetches
///
/// Keyed by the normalized [`FetchParams`]. Holds at most `capacity` entries
/// (oldest inserted evicted first); entries older than `ttl` are misses.
/// The lock is never held across an `.await`.
pub struct HeadlineCache {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<Inner>,
}

impl HeadlineCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.capacity > 0 && !self.ttl.is_zero()
    }

    /// Fresh cached articles for `params`, if any
    pub fn get(&self, params: &FetchParams) -> Option<Vec<ArticleRecord>> {
        if !self.is_enabled() {
            return None;
        }

        let mut inner = self.lock();
        if let Some(entry) = inner.entries.get(params) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.articles.clone());
            }
            inner.entries.remove(params);
        }
        None
    }

    pub fn insert(&self, params: FetchParams, articles: Vec<ArticleRecord>) {
        if !self.is_enabled() {
            return;
        }

        let mut inner = self.lock();
        let entry = Entry {
            inserted_at: Instant::now(),
            articles,
        };

        if inner.entries.insert(params.clone(), entry).is_some() {
            inner.order.retain(|k| k != &params);
        }
        inner.order.push_back(params);

        while inner.entries.len() > self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }

        // Expired keys removed by `get` can linger in `order`
        if inner.order.len() > self.capacity * 2 {
            let Inner { entries, order } = &mut *inner;
            order.retain(|k| entries.contains_key(k));
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned memo only loses cached data
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
