use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::time::sleep;

const EVICTION_INTERVAL: Duration = Duration::from_secs(30);

/// Weighted sliding window: the previous window's count decays linearly
/// while the current one fills.
#[derive(Debug)]
struct SlidingWindow {
    window_size: Duration,
    limit: u64,
    current_window_start: Instant,
    current_count: u64,
    prev_count: u64,
    last_seen: Instant,
}

impl SlidingWindow {
    fn new(window_size: Duration, limit: u64, now: Instant) -> Self {
        Self {
            window_size,
            limit,
            current_window_start: now,
            current_count: 0,
            prev_count: 0,
            last_seen: now,
        }
    }

    fn roll(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.current_window_start);
        if elapsed >= self.window_size * 2 {
            self.prev_count = 0;
            self.current_count = 0;
            self.current_window_start = now;
        } else if elapsed >= self.window_size {
            self.prev_count = self.current_count;
            self.current_count = 0;
            self.current_window_start += self.window_size;
        }
    }

    fn allow(&mut self, now: Instant) -> RateDecision {
        self.last_seen = now;
        self.roll(now);

        let elapsed = now.duration_since(self.current_window_start);
        let weight = elapsed.as_secs_f64() / self.window_size.as_secs_f64();
        let effective = (self.prev_count as f64) * (1.0 - weight) + (self.current_count as f64);

        if effective + 1.0 <= self.limit as f64 {
            self.current_count += 1;
            RateDecision {
                allowed: true,
                limit: self.limit,
                remaining: (self.limit as f64 - effective - 1.0).floor().max(0.0) as u64,
                retry_after: None,
            }
        } else {
            let until_roll = self.window_size.saturating_sub(elapsed);
            RateDecision {
                allowed: false,
                limit: self.limit,
                remaining: 0,
                retry_after: Some(until_roll.as_secs().max(1)),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Seconds until another request may succeed.
    pub retry_after: Option<u64>,
}

type Key = String;

/// Per-client sliding-window limiter with background eviction of idle clients.
#[derive(Clone)]
pub struct RateLimiterStore {
    map: Arc<DashMap<Key, Arc<Mutex<SlidingWindow>>>>,
    window_size: Duration,
    limit: u64,
}

impl RateLimiterStore {
    /// Must be called inside a tokio runtime; spawns the eviction task.
    pub fn new(window_size: Duration, limit: u64) -> Self {
        let store = Self::without_eviction(window_size, limit);

        let map = store.map.clone();
        let ttl = window_size * 2;
        tokio::spawn(async move {
            loop {
                sleep(EVICTION_INTERVAL).await;
                let now = Instant::now();
                map.retain(|_, window| now.duration_since(window.lock().last_seen) <= ttl);
                tracing::trace!(clients = map.len(), "Rate limiter eviction pass");
            }
        });

        store
    }

    fn without_eviction(window_size: Duration, limit: u64) -> Self {
        Self {
            map: Arc::new(DashMap::new()),
            window_size: window_size.max(Duration::from_secs(1)),
            limit: limit.max(1),
        }
    }

    fn window_for(&self, key: &str) -> Arc<Mutex<SlidingWindow>> {
        if let Some(existing) = self.map.get(key) {
            return existing.clone();
        }
        self.map
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(SlidingWindow::new(self.window_size, self.limit, Instant::now()))))
            .clone()
    }

    pub fn check(&self, key: &str) -> RateDecision {
        let window = self.window_for(key);
        let mut window = window.lock();
        window.allow(Instant::now())
    }
}
