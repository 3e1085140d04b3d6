//! Metadata emitter.
//!
//! Records where every element occurrence and style group of a view lives in
//! the source, for editor tooling. Deliveries to the host callback are batched:
//! views finishing within one window produce a single callback carrying the
//! merged table. Each delivery carries only the views recorded since the
//! previous one. The batch is driven by an injected clock, never by sleeping.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ast::SourceLocation;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewMeta {
    /// Source file, relative to the configured base path.
    pub file: String,
    /// `tag + key` → end of the element in source.
    pub els: IndexMap<String, SourceLocation>,
    /// Style name → start of its assignment in source.
    pub styles: IndexMap<String, SourceLocation>,
}

pub type MetaTable = IndexMap<String, ViewMeta>;
pub type MetaCallback = Arc<dyn Fn(&MetaTable) + Send + Sync>;

// ═══════════════════════════════════════════════════════════════════════════════
// CLOCKS
// ═══════════════════════════════════════════════════════════════════════════════

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
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
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BATCHER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct MetaBatcher {
    window: Duration,
    callback: Option<MetaCallback>,
    table: MetaTable,
    /// Start of the open batch, if any view is waiting for delivery.
    opened_at: Option<Instant>,
    deliveries: usize,
}

impl MetaBatcher {
    pub fn new(window: Duration, callback: Option<MetaCallback>) -> Self {
        Self {
            window,
            callback,
            table: MetaTable::new(),
            opened_at: None,
            deliveries: 0,
        }
    }

    /// Adds one finished view. A batch whose window already elapsed is
    /// delivered first, so the new view opens the next batch.
    pub fn record(&mut self, view: &str, meta: ViewMeta, now: Instant) {
        if self.callback.is_none() {
            return;
        }
        self.poll(now);
        self.table.insert(view.to_string(), meta);
        if self.opened_at.is_none() {
            self.opened_at = Some(now);
        }
    }

    /// Delivers the open batch if its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.opened_at {
            Some(opened) if now.saturating_duration_since(opened) >= self.window => self.flush(),
            _ => false,
        }
    }

    /// Delivers the open batch immediately.
    pub fn flush(&mut self) -> bool {
        if self.opened_at.take().is_none() {
            return false;
        }
        let table = std::mem::take(&mut self.table);
        match &self.callback {
            Some(callback) => {
                log::debug!("delivering metadata for {} views", table.len());
                callback(&table);
                self.deliveries += 1;
                true
            }
            None => false,
        }
    }

    /// Drops the open batch without delivering it.
    pub fn cancel(&mut self) {
        self.opened_at = None;
        self.table.clear();
    }

    pub fn has_pending(&self) -> bool {
        self.opened_at.is_some()
    }

    pub fn deliveries(&self) -> usize {
        self.deliveries
    }

    /// Views waiting for the next delivery.
    pub fn table(&self) -> &MetaTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_batcher(window_ms: u64) -> (MetaBatcher, Arc<Mutex<Vec<Vec<String>>>>) {
        let seen: Arc<Mutex<Vec<Vec<String>>>> = Arc::new(Mutex::new(vec![]));
        let sink = seen.clone();
        let callback: MetaCallback = Arc::new(move |table: &MetaTable| {
            sink.lock().unwrap().push(table.keys().cloned().collect());
        });
        (
            MetaBatcher::new(Duration::from_millis(window_ms), Some(callback)),
            seen,
        )
    }

    #[test]
    fn test_views_within_window_coalesce() {
        let clock = ManualClock::new();
        let (mut batcher, seen) = recording_batcher(100);

        batcher.record("A", ViewMeta::default(), clock.now());
        clock.advance(Duration::from_millis(30));
        batcher.record("B", ViewMeta::default(), clock.now());
        clock.advance(Duration::from_millis(30));
        assert!(!batcher.poll(clock.now()));

        clock.advance(Duration::from_millis(50));
        assert!(batcher.poll(clock.now()));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], vec!["A", "B"]);
    }

    #[test]
    fn test_late_record_flushes_previous_batch_first() {
        let clock = ManualClock::new();
        let (mut batcher, seen) = recording_batcher(100);

        batcher.record("A", ViewMeta::default(), clock.now());
        clock.advance(Duration::from_millis(150));
        batcher.record("B", ViewMeta::default(), clock.now());

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(batcher.has_pending());
        assert!(batcher.flush());
        assert_eq!(batcher.deliveries(), 2);
        assert_eq!(seen.lock().unwrap()[1], vec!["B"]);
    }

    #[test]
    fn test_each_delivery_carries_only_new_views() {
        let clock = ManualClock::new();
        let (mut batcher, seen) = recording_batcher(100);

        batcher.record("A", ViewMeta::default(), clock.now());
        assert!(batcher.flush());
        assert!(batcher.table().is_empty());

        batcher.record("B", ViewMeta::default(), clock.now());
        batcher.record("C", ViewMeta::default(), clock.now());
        assert!(batcher.flush());

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![vec!["A"], vec!["B", "C"]]);
    }

    #[test]
    fn test_cancel_drops_pending_batch() {
        let clock = ManualClock::new();
        let (mut batcher, seen) = recording_batcher(100);

        batcher.record("A", ViewMeta::default(), clock.now());
        batcher.cancel();
        assert!(batcher.table().is_empty());
        assert!(!batcher.flush());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_no_callback_never_opens_batch() {
        let mut batcher = MetaBatcher::new(Duration::from_millis(100), None);
        batcher.record("A", ViewMeta::default(), Instant::now());
        assert!(!batcher.has_pending());
        assert!(!batcher.flush());
    }
}
