//! Run loop and auto-snapshot task.
//!
//! This module drives the machine in frame-sized slices. It provides:
//! 1. **Run state:** `Idle` until a cartridge is loaded, then `Running` and `Paused`.
//! 2. **Speed:** A multiplier in {1, 2, 4, 8} that scales the per-tick cycle budget.
//! 3. **Ticks:** Advance, snapshot into the rewind ring, then render. Engine and snapshot
//!    failures are logged and counted; they never stop the loop.
//! 4. **Auto-snapshot:** A named thread that pushes a tagged snapshot on a fixed interval while
//!    running, and is joined before `pause` returns.

use super::machine::{self, SharedMachine};
use crate::common::error::{Error, Result};
use crate::config::SchedulerConfig;
use crate::core::ExecutionEngine;
use crate::rewind::RewindStore;
use crate::stats::SchedulerStats;
use crate::storage::Metadata;
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing loaded yet.
    Idle,
    /// Ticks execute and autosave runs.
    Running,
    /// Ticks are no-ops.
    Paused,
}

/// Emulation speed relative to real time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedMultiplier {
    /// Real time.
    #[default]
    X1,
    /// Double speed.
    X2,
    /// Quadruple speed.
    X4,
    /// Eight times speed.
    X8,
}

impl SpeedMultiplier {
    /// Returns the budget factor.
    pub const fn factor(self) -> u64 {
        match self {
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 4,
            Self::X8 => 8,
        }
    }

    /// Returns the next speed in the cycle `1 -> 2 -> 4 -> 8 -> 1`.
    pub const fn next(self) -> Self {
        match self {
            Self::X1 => Self::X2,
            Self::X2 => Self::X4,
            Self::X4 => Self::X8,
            Self::X8 => Self::X1,
        }
    }
}

impl TryFrom<u32> for SpeedMultiplier {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Self::X1),
            2 => Ok(Self::X2),
            4 => Ok(Self::X4),
            8 => Ok(Self::X8),
            other => Err(Error::InvalidSpeed(other)),
        }
    }
}

impl fmt::Display for SpeedMultiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.factor())
    }
}

/// Outcome of one [`Scheduler::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Whether the tick did any work (false unless running).
    pub ran: bool,
    /// Cycle budget handed to the engine.
    pub cycles_requested: u64,
    /// Cycles the engine executed.
    pub cycles_executed: u64,
    /// Id of the rewind entry pushed by this tick.
    pub snapshot_id: Option<String>,
    /// Whether the engine presented the frame itself.
    pub rendered: bool,
}

/// Host presentation hook, called after ticks the engine did not render.
pub type Presenter = Box<dyn FnMut() + Send>;

/// Periodic snapshot thread.
struct AutoSnapshot {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl AutoSnapshot {
    fn spawn(
        interval: Duration,
        machine: SharedMachine,
        rewind: Arc<RewindStore>,
        stats: Arc<SchedulerStats>,
    ) -> Result<Self> {
        let (stop, stop_rx) = channel::bounded::<()>(1);
        let handle = thread::Builder::new()
            .name("auto-snapshot".to_string())
            .spawn(move || {
                while let Err(RecvTimeoutError::Timeout) = stop_rx.recv_timeout(interval) {
                    autosave_once(&machine, &rewind, &stats);
                }
            })?;
        Ok(Self { stop, handle })
    }

    fn stop(self) {
        let _ = self.stop.send(());
        if self.handle.join().is_err() {
            tracing::warn!("auto-snapshot thread panicked");
        }
    }
}

fn autosave_once(machine: &SharedMachine, rewind: &RewindStore, stats: &SchedulerStats) {
    let mut machine = machine::lock(machine);
    if machine.cartridge().is_none() {
        return;
    }
    match machine.snapshot() {
        Ok(bytes) => {
            let entry = rewind.push(bytes, tags(machine.rom_name(), Some(("autosave", "true"))));
            stats.record_autosave(true);
            tracing::debug!(id = %entry.id, "autosaved snapshot");
        }
        Err(error) => {
            stats.record_autosave(false);
            tracing::warn!(%error, "autosave failed");
        }
    }
}

/// Builds snapshot tags: `rom` plus an optional extra pair.
pub(crate) fn tags(rom: &str, extra: Option<(&str, &str)>) -> Metadata {
    let mut meta = Metadata::new();
    let _ = meta.insert("rom".into(), rom.to_string());
    if let Some((key, value)) = extra {
        let _ = meta.insert(key.to_string(), value.to_string());
    }
    meta
}

/// Drives a shared machine and feeds the rewind ring.
pub struct Scheduler {
    machine: SharedMachine,
    rewind: Arc<RewindStore>,
    stats: Arc<SchedulerStats>,
    state: RunState,
    speed: SpeedMultiplier,
    cycles_per_tick: u64,
    frame_period: Duration,
    autosave_interval: Option<Duration>,
    autosave: Option<AutoSnapshot>,
    presenter: Option<Presenter>,
}

impl Scheduler {
    /// Creates an idle scheduler.
    ///
    /// # Arguments
    ///
    /// * `config` - Tick budget, frame rate and autosave interval.
    /// * `machine` - Machine to drive.
    /// * `rewind` - Ring receiving per-tick snapshots and autosaves.
    pub fn new(config: &SchedulerConfig, machine: SharedMachine, rewind: Arc<RewindStore>) -> Self {
        Self {
            machine,
            rewind,
            stats: Arc::new(SchedulerStats::default()),
            state: RunState::Idle,
            speed: SpeedMultiplier::X1,
            cycles_per_tick: config.cycles_per_tick,
            frame_period: config.frame_period(),
            autosave_interval: config.autosave_interval(),
            autosave: None,
            presenter: None,
        }
    }

    /// Returns the current run state.
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Returns whether ticks currently execute.
    pub const fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running)
    }

    /// Returns the speed multiplier.
    pub const fn speed(&self) -> SpeedMultiplier {
        self.speed
    }

    /// Returns the counters.
    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Returns the cycle budget of the next tick.
    pub const fn tick_budget(&self) -> u64 {
        self.cycles_per_tick.saturating_mul(self.speed.factor())
    }

    /// Installs the host presentation hook.
    pub fn set_presenter(&mut self, presenter: Presenter) {
        self.presenter = Some(presenter);
    }

    /// Leaves `Idle` after the first cartridge load.
    pub fn mark_loaded(&mut self) {
        if self.state == RunState::Idle {
            self.state = RunState::Paused;
        }
    }

    /// Starts running and resumes the auto-snapshot task; no-op when already running.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        if let Some(interval) = self.autosave_interval {
            self.autosave = Some(AutoSnapshot::spawn(
                interval,
                Arc::clone(&self.machine),
                Arc::clone(&self.rewind),
                Arc::clone(&self.stats),
            )?);
        }
        self.state = RunState::Running;
        tracing::info!(speed = %self.speed, "scheduler running");
        Ok(())
    }

    /// Pauses; the auto-snapshot task is joined before this returns. No-op when not running.
    pub fn pause(&mut self) {
        if !self.is_running() {
            return;
        }
        if let Some(task) = self.autosave.take() {
            task.stop();
        }
        self.state = RunState::Paused;
        tracing::info!("scheduler paused");
    }

    /// Executes one fetch-equivalent and renders; the run state is unchanged.
    pub fn step_once(&mut self) -> Result<u64> {
        let (cycles, rendered) = {
            let mut machine = machine::lock(&self.machine);
            let cycles = machine.step()?;
            (cycles, machine.render())
        };
        self.present(rendered);
        Ok(cycles)
    }

    /// Sets the speed multiplier.
    ///
    /// # Errors
    ///
    /// `InvalidSpeed` unless `multiplier` is 1, 2, 4 or 8.
    pub fn set_speed(&mut self, multiplier: u32) -> Result<SpeedMultiplier> {
        self.speed = SpeedMultiplier::try_from(multiplier)?;
        Ok(self.speed)
    }

    /// Advances to the next speed and returns it.
    pub fn toggle_speed(&mut self) -> SpeedMultiplier {
        self.speed = self.speed.next();
        self.speed
    }

    /// Runs one frame slice: advance, snapshot into the ring, render.
    ///
    /// Does nothing unless running.
    pub fn tick(&mut self) -> TickReport {
        if !self.is_running() {
            return TickReport::default();
        }
        let requested = self.tick_budget();
        let mut report = TickReport {
            ran: true,
            cycles_requested: requested,
            ..TickReport::default()
        };

        {
            let mut machine = machine::lock(&self.machine);
            match machine.advance(requested) {
                Ok(executed) => report.cycles_executed = executed,
                Err(error) => {
                    self.stats.record_engine_failure();
                    tracing::warn!(%error, "engine advance failed");
                }
            }
            match machine.snapshot() {
                Ok(bytes) => {
                    let entry = self.rewind.push(bytes, tags(machine.rom_name(), None));
                    report.snapshot_id = Some(entry.id);
                    self.stats.record_snapshot(true);
                }
                Err(error) => {
                    self.stats.record_snapshot(false);
                    tracing::warn!(%error, "tick snapshot failed");
                }
            }
            report.rendered = machine.render();
        }

        self.stats.record_tick(requested, report.cycles_executed);
        self.present(report.rendered);
        report
    }

    /// Ticks at the configured frame rate until `frames` ticks ran or the scheduler stops running.
    ///
    /// Returns the number of ticks that did work.
    pub fn run(&mut self, frames: u64) -> u64 {
        let mut ran = 0;
        while ran < frames && self.is_running() {
            let started = Instant::now();
            let _ = self.tick();
            ran += 1;
            if let Some(remaining) = self.frame_period.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }
        ran
    }

    fn present(&mut self, rendered: bool) {
        if rendered {
            return;
        }
        if let Some(presenter) = self.presenter.as_mut() {
            presenter();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(task) = self.autosave.take() {
            task.stop();
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state)
            .field("speed", &self.speed)
            .field("cycles_per_tick", &self.cycles_per_tick)
            .field("autosave_interval", &self.autosave_interval)
            .field("autosave_active", &self.autosave.is_some())
            .finish_non_exhaustive()
    }
}
