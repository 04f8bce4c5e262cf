//! Fixed-window rate limiting keyed by caller identity.
//!
//! # Responsibilities
//! - Count requests per key within a fixed time window
//! - Report remaining budget and retry-after on rejection
//! - Bound memory with a background sweep of expired windows
//!
//! # Design Decisions
//! - Fixed window, not sliding: the window resets wholesale at its deadline
//! - Store is a trait so a shared external store can replace the in-process
//!   map for multi-instance deployments
//! - Per-key read-modify-write is atomic via the map's entry guard
//! - The sweep never runs on the request path

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::observability::metrics;

/// A named rate-limit tier: at most `max_requests` per `window_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitTier {
    pub name: &'static str,
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RateLimitTier {
    pub const AUTH: Self = Self {
        name: "auth",
        max_requests: 20,
        window_secs: 60,
    };
    pub const API: Self = Self {
        name: "api",
        max_requests: 60,
        window_secs: 60,
    };
    pub const PAGE: Self = Self {
        name: "page",
        max_requests: 120,
        window_secs: 60,
    };
    pub const SIGNUP: Self = Self {
        name: "signup",
        max_requests: 10,
        window_secs: 300,
    };

    fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitVerdict {
    pub allowed: bool,
    pub remaining: u32,
    pub retry_after_secs: u64,
}

/// One counting window for a key.
///
/// `count` only moves up while `now < reset_at`; once the deadline passes
/// the entry is dead and gets replaced, never incremented.
#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    reset_at: Instant,
}

/// Storage seam for the limiter.
///
/// The in-process map below serves a single instance; a multi-instance
/// deployment would back this with a shared key-value store instead.
pub trait RateLimitStore: Send + Sync + 'static {
    /// Record one request for `key` under `tier` at time `now`.
    fn record(&self, key: &str, tier: &RateLimitTier, now: Instant) -> RateLimitVerdict;

    /// Delete every entry whose window has expired. Returns the count removed.
    fn sweep(&self, now: Instant) -> usize;

    /// Number of live entries (expired-but-unswept included).
    fn len(&self) -> usize;
}

/// Concurrent in-process store backed by a sharded map.
#[derive(Default)]
pub struct InMemoryStore {
    entries: DashMap<String, RateLimitEntry>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for InMemoryStore {
    fn record(&self, key: &str, tier: &RateLimitTier, now: Instant) -> RateLimitVerdict {
        use dashmap::mapref::entry::Entry;

        // The entry guard holds the shard lock for the whole
        // read-modify-write, so concurrent requests on the same key
        // cannot lose counts.
        match self.entries.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(RateLimitEntry {
                    count: 1,
                    reset_at: now + tier.window(),
                });
                RateLimitVerdict {
                    allowed: true,
                    remaining: tier.max_requests - 1,
                    retry_after_secs: 0,
                }
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if entry.reset_at <= now {
                    // Window expired: replace, never increment.
                    *entry = RateLimitEntry {
                        count: 1,
                        reset_at: now + tier.window(),
                    };
                    return RateLimitVerdict {
                        allowed: true,
                        remaining: tier.max_requests - 1,
                        retry_after_secs: 0,
                    };
                }

                entry.count += 1;
                if entry.count > tier.max_requests {
                    let left = entry.reset_at - now;
                    let retry_after_secs = left.as_secs() + u64::from(left.subsec_nanos() > 0);
                    RateLimitVerdict {
                        allowed: false,
                        remaining: 0,
                        retry_after_secs,
                    }
                } else {
                    RateLimitVerdict {
                        allowed: true,
                        remaining: tier.max_requests - entry.count,
                        retry_after_secs: 0,
                    }
                }
            }
        }
    }

    fn sweep(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.reset_at > now);
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Rate limiter facade used by the admission pipeline.
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    /// Check one request against `tier`, counting it.
    pub fn check(&self, key: &str, tier: &RateLimitTier) -> RateLimitVerdict {
        self.store.record(key, tier, Instant::now())
    }

    pub fn store(&self) -> Arc<dyn RateLimitStore> {
        self.store.clone()
    }
}

/// Spawn the background sweep task.
///
/// Runs until the shutdown channel fires; deletions are immediately
/// visible to concurrent lookups.
pub fn spawn_sweeper(
    store: Arc<dyn RateLimitStore>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.sweep(Instant::now());
                    if removed > 0 {
                        tracing::debug!(removed, live = store.len(), "Swept expired rate limit entries");
                    }
                    metrics::record_sweep(removed);
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate limit sweeper stopping");
                    break;
                }
            }
        }
    })
}
