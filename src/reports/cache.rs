//! Read-through report cache.
//!
//! Entries are keyed by report id and dropped when the sequencer observes a
//! confirmed write against that id, or when they outlive the TTL. The chain
//! stays authoritative; nothing here is ever written back.
//!
//! Every invalidation bumps a cache-wide epoch. A reader captures the epoch
//! before its chain read and stores the result only if no invalidation
//! happened meanwhile, so a read that raced a confirmed write never
//! repopulates the entry with the old state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use alloy::primitives::U256;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::reports::types::BugReport;

#[derive(Debug, Clone)]
struct CachedReport {
    report: BugReport,
    cached_at: Instant,
}

/// A thread-safe cache of reports.
#[derive(Debug, Clone)]
pub struct ReportCache {
    inner: Arc<DashMap<U256, CachedReport>>,
    epoch: Arc<AtomicU64>,
    ttl: Duration,
}

impl ReportCache {
    /// Create a new empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            epoch: Arc::new(AtomicU64::new(0)),
            ttl,
        }
    }

    /// Get a fresh report, evicting it if it expired.
    pub fn get(&self, id: &U256) -> Option<BugReport> {
        let expired = match self.inner.get(id) {
            Some(entry) if entry.cached_at.elapsed() < self.ttl => {
                return Some(entry.report.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.inner.remove(id);
            metrics::record_cache_size(self.inner.len());
        }
        None
    }

    /// Current invalidation epoch. Capture it before reading from the chain.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Store a report read from the chain, unless an invalidation happened
    /// since `epoch` was captured. Returns whether the report was stored.
    pub fn insert(&self, report: BugReport, epoch: u64) -> bool {
        // The shard lock is held across the epoch check, so an invalidation
        // either lands before the check or removes the entry afterwards.
        let entry = self.inner.entry(report.id);
        if self.epoch() != epoch {
            tracing::debug!(report_id = %report.id, "Skipping cache fill after invalidation");
            return false;
        }

        let cached = CachedReport {
            report,
            cached_at: Instant::now(),
        };
        match entry {
            Entry::Occupied(mut e) => {
                e.insert(cached);
            }
            Entry::Vacant(e) => {
                e.insert(cached);
            }
        }
        metrics::record_cache_size(self.inner.len());
        true
    }

    /// Drop the entry for a report whose on-chain state changed.
    pub fn invalidate(&self, id: &U256) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if self.inner.remove(id).is_some() {
            tracing::debug!(report_id = %id, "Report cache entry invalidated");
            metrics::record_cache_size(self.inner.len());
        }
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        purge(&self.inner, self.ttl)
    }

    /// Purge expired entries every `every` until the cache is dropped.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let inner: Weak<DashMap<U256, CachedReport>> = Arc::downgrade(&self.inner);
        let ttl = self.ttl;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(map) = inner.upgrade() else {
                    break;
                };
                let purged = purge(&map, ttl);
                if purged > 0 {
                    tracing::debug!(purged, remaining = map.len(), "Swept expired reports");
                }
            }
        })
    }

    /// Number of cached entries, fresh or not.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

fn purge(map: &DashMap<U256, CachedReport>, ttl: Duration) -> usize {
    let before = map.len();
    map.retain(|_, entry| entry.cached_at.elapsed() < ttl);
    let after = map.len();
    if after != before {
        metrics::record_cache_size(after);
    }
    before.saturating_sub(after)
}
