use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing coordinator activity since startup.
#[derive(Debug)]
pub struct CycleCounters {
    notifications: AtomicU64,
    duplicates: AtomicU64,
    cycles_started: AtomicU64,
    cycles_published: AtomicU64,
    cycles_aborted: AtomicU64,
}

impl Default for CycleCounters {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleCounters {
    pub const fn new() -> Self {
        Self {
            notifications: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            cycles_started: AtomicU64::new(0),
            cycles_published: AtomicU64::new(0),
            cycles_aborted: AtomicU64::new(0),
        }
    }

    pub fn inc_notifications(&self) {
        self.notifications.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_duplicates(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cycles_started(&self) {
        self.cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cycles_published(&self) {
        self.cycles_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cycles_aborted(&self) {
        self.cycles_aborted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CycleCountersSnapshot {
        CycleCountersSnapshot {
            notifications: self.notifications.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            cycles_started: self.cycles_started.load(Ordering::Relaxed),
            cycles_published: self.cycles_published.load(Ordering::Relaxed),
            cycles_aborted: self.cycles_aborted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CycleCountersSnapshot {
    pub notifications: u64,
    pub duplicates: u64,
    pub cycles_started: u64,
    pub cycles_published: u64,
    pub cycles_aborted: u64,
}
