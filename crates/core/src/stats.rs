//! Scheduler statistics collection and reporting.
//!
//! This module tracks what the run loop and the auto-snapshot task have done. It provides:
//! 1. **Execution:** Ticks, cycles requested and cycles actually executed.
//! 2. **Snapshots:** Per-tick snapshots pushed and per-tick failures.
//! 3. **Autosave:** Autosaves pushed and autosave failures.
//!
//! Counters are atomics because the auto-snapshot thread updates them concurrently with ticks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Live counters shared between the scheduler and its auto-snapshot task.
#[derive(Debug)]
pub struct SchedulerStats {
    start_time: Instant,
    ticks: AtomicU64,
    cycles_requested: AtomicU64,
    cycles_executed: AtomicU64,
    engine_failures: AtomicU64,
    snapshots_pushed: AtomicU64,
    snapshot_failures: AtomicU64,
    autosaves: AtomicU64,
    autosave_failures: AtomicU64,
}

/// Point-in-time copy of [`SchedulerStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSummary {
    /// Ticks that did work.
    pub ticks: u64,
    /// Cycle budget handed to the engine.
    pub cycles_requested: u64,
    /// Cycles the engine reported as executed.
    pub cycles_executed: u64,
    /// Ticks whose `advance` failed.
    pub engine_failures: u64,
    /// Snapshots pushed by ticks.
    pub snapshots_pushed: u64,
    /// Ticks whose snapshot failed.
    pub snapshot_failures: u64,
    /// Snapshots pushed by the auto-snapshot task.
    pub autosaves: u64,
    /// Auto-snapshot attempts that failed.
    pub autosave_failures: u64,
}

impl Default for SchedulerStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            ticks: AtomicU64::new(0),
            cycles_requested: AtomicU64::new(0),
            cycles_executed: AtomicU64::new(0),
            engine_failures: AtomicU64::new(0),
            snapshots_pushed: AtomicU64::new(0),
            snapshot_failures: AtomicU64::new(0),
            autosaves: AtomicU64::new(0),
            autosave_failures: AtomicU64::new(0),
        }
    }
}

fn bump(counter: &AtomicU64, by: u64) {
    let _ = counter.fetch_add(by, Ordering::Relaxed);
}

impl SchedulerStats {
    pub(crate) fn record_tick(&self, requested: u64, executed: u64) {
        bump(&self.ticks, 1);
        bump(&self.cycles_requested, requested);
        bump(&self.cycles_executed, executed);
    }

    pub(crate) fn record_engine_failure(&self) {
        bump(&self.engine_failures, 1);
    }

    pub(crate) fn record_snapshot(&self, ok: bool) {
        bump(if ok { &self.snapshots_pushed } else { &self.snapshot_failures }, 1);
    }

    pub(crate) fn record_autosave(&self, ok: bool) {
        bump(if ok { &self.autosaves } else { &self.autosave_failures }, 1);
    }

    /// Copies the current counter values.
    pub fn summary(&self) -> StatsSummary {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSummary {
            ticks: get(&self.ticks),
            cycles_requested: get(&self.cycles_requested),
            cycles_executed: get(&self.cycles_executed),
            engine_failures: get(&self.engine_failures),
            snapshots_pushed: get(&self.snapshots_pushed),
            snapshot_failures: get(&self.snapshot_failures),
            autosaves: get(&self.autosaves),
            autosave_failures: get(&self.autosave_failures),
        }
    }

    /// Prints a report to stdout.
    #[allow(clippy::cast_precision_loss)]
    pub fn print(&self) {
        let s = self.summary();
        let seconds = self.start_time.elapsed().as_secs_f64().max(f64::EPSILON);
        let fps = s.ticks as f64 / seconds;
        println!("\n==========================================================");
        println!("SESSION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {seconds:.4} s");
        println!("ticks                    {}", s.ticks);
        println!("ticks_per_second         {fps:.2}");
        println!("cycles_requested         {}", s.cycles_requested);
        println!("cycles_executed          {}", s.cycles_executed);
        println!("engine_failures          {}", s.engine_failures);
        println!("----------------------------------------------------------");
        println!("snapshots_pushed         {}", s.snapshots_pushed);
        println!("snapshot_failures        {}", s.snapshot_failures);
        println!("autosaves                {}", s.autosaves);
        println!("autosave_failures        {}", s.autosave_failures);
        println!("==========================================================");
    }
}
