use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
pub struct Stats {
    start_ms: AtomicU64,
    last_log_ms: AtomicU64,

    cycles: AtomicU64,
    fetch_ok: AtomicU64,
    fetch_empty: AtomicU64,
    fetch_err: AtomicU64,
    rows_appended: AtomicU64,
}

impl Stats {
    pub fn new(now_ms: u64) -> Arc<Self> {
        let s = Arc::new(Self::default());
        s.start_ms.store(now_ms, Ordering::Relaxed);
        s.last_log_ms.store(now_ms, Ordering::Relaxed);
        s
    }

    pub fn inc_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fetch_ok(&self) {
        self.fetch_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fetch_empty(&self) {
        self.fetch_empty.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fetch_err(&self) {
        self.fetch_err.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rows_appended(&self) {
        self.rows_appended.fetch_add(1, Ordering::Relaxed);
    }

    pub fn should_log(&self, now_ms: u64, every_sec: u64) -> bool {
        if every_sec == 0 { return false; }
        let last = self.last_log_ms.load(Ordering::Relaxed);
        now_ms.saturating_sub(last) >= every_sec.saturating_mul(1000)
    }

    pub fn mark_logged(&self, now_ms: u64) {
        self.last_log_ms.store(now_ms, Ordering::Relaxed);
    }

    pub fn snapshot(&self, now_ms: u64) -> StatsSnapshot {
        let start = self.start_ms.load(Ordering::Relaxed);
        StatsSnapshot {
            now_ms,
            up_sec: (now_ms.saturating_sub(start)) / 1000,
            cycles: self.cycles.load(Ordering::Relaxed),
            fetch_ok: self.fetch_ok.load(Ordering::Relaxed),
            fetch_empty: self.fetch_empty.load(Ordering::Relaxed),
            fetch_err: self.fetch_err.load(Ordering::Relaxed),
            rows_appended: self.rows_appended.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub now_ms: u64,
    pub up_sec: u64,
    pub cycles: u64,
    pub fetch_ok: u64,
    pub fetch_empty: u64,
    pub fetch_err: u64,
    pub rows_appended: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_log_respects_interval() {
        let stats = Stats::new(1_000);
        assert!(!stats.should_log(1_500, 300));
        assert!(stats.should_log(302_000, 300));
        stats.mark_logged(302_000);
        assert!(!stats.should_log(302_500, 300));
        // 0 disables the summary entirely.
        assert!(!stats.should_log(u64::MAX, 0));
    }

    #[test]
    fn snapshot_reflects_counters() {
        let stats = Stats::new(0);
        stats.inc_cycle();
        stats.inc_fetch_ok();
        stats.inc_fetch_ok();
        stats.inc_fetch_err();
        stats.inc_rows_appended();
        let snap = stats.snapshot(5_000);
        assert_eq!(snap.up_sec, 5);
        assert_eq!(snap.cycles, 1);
        assert_eq!(snap.fetch_ok, 2);
        assert_eq!(snap.fetch_empty, 0);
        assert_eq!(snap.fetch_err, 1);
        assert_eq!(snap.rows_appended, 1);
    }
}
