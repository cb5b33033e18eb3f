//! Emulator facade.
//!
//! This module ties the machine, the scheduler, the rewind ring and the ROM library together
//! behind the operations a host front-end calls. It performs:
//! 1. **Loading:** Cartridges from bytes or from the library, with an initial snapshot so rewind
//!    works immediately.
//! 2. **Time travel:** Restore, rewind, export, import and session resume.
//! 3. **Engine management:** Attaching and detaching an external engine while not running.
//! 4. **Status:** Every user-visible outcome is also reported to the host's status sink.

use super::machine::{self, Machine, SharedMachine};
use super::scheduler::{Scheduler, SpeedMultiplier, TickReport, tags};
use super::status::{ResumeSource, StatusEvent, StatusSink};
use crate::common::error::{Error, Result};
use crate::config::Config;
use crate::core::{CartridgeMeta, ExecutionEngine};
use crate::rewind::{RewindEntry, RewindStore};
use crate::storage::{Metadata, PersistentStore, RomLibrary};
use std::sync::Arc;

/// Exported savestate ready to be written to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveArtifact {
    /// Suggested file name: `<cartridge name or "save">.sav`.
    pub filename: String,
    /// Snapshot bytes.
    pub bytes: Vec<u8>,
}

/// Host-facing entry point.
pub struct Emulator {
    machine: SharedMachine,
    scheduler: Scheduler,
    rewind: Arc<RewindStore>,
    library: RomLibrary,
    status: Option<StatusSink>,
}

impl Emulator {
    /// Builds an emulator from `config` over `store`.
    ///
    /// # Arguments
    ///
    /// * `config` - Memory map, engine, scheduler and rewind settings.
    /// * `store` - Persistent store shared by the rewind ring and the ROM library.
    pub fn new(config: &Config, store: Arc<dyn PersistentStore>) -> Result<Self> {
        let machine = Machine::from_config(config)?.into_shared();
        let rewind = Arc::new(RewindStore::new(config.rewind.max_slots, Arc::clone(&store))?);
        let scheduler = Scheduler::new(&config.scheduler, Arc::clone(&machine), Arc::clone(&rewind));
        Ok(Self {
            machine,
            scheduler,
            rewind,
            library: RomLibrary::new(store),
            status: None,
        })
    }

    /// Installs the status callback.
    pub fn set_status_sink(&mut self, sink: StatusSink) {
        self.status = Some(sink);
    }

    /// Returns the shared machine.
    pub const fn machine(&self) -> &SharedMachine {
        &self.machine
    }

    /// Returns the scheduler.
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns the scheduler mutably.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Returns the rewind ring.
    pub fn rewind_store(&self) -> &RewindStore {
        &self.rewind
    }

    /// Returns the ROM library.
    pub const fn library(&self) -> &RomLibrary {
        &self.library
    }

    /// Loads a cartridge into the active engine and pushes an initial snapshot.
    pub fn load_cartridge(&mut self, bytes: &[u8], meta: CartridgeMeta) -> Result<()> {
        if let Err(error) = self.install(bytes, &meta) {
            self.emit(StatusEvent::LoadFailed {
                reason: error.to_string(),
            });
            return Err(error);
        }

        if let Some(id) = meta.library_id.as_deref() {
            if let Err(error) = self.library.set_last(id, &meta.name) {
                tracing::warn!(%error, "could not record last cartridge");
            }
        }

        {
            let mut machine = machine::lock(&self.machine);
            match machine.snapshot() {
                Ok(snapshot) => {
                    let _ = self.rewind.push(snapshot, tags(&meta.name, None));
                }
                Err(error) => tracing::warn!(%error, "initial snapshot failed"),
            }
        }

        self.emit(StatusEvent::Loaded { name: meta.name });
        Ok(())
    }

    /// Loads a cartridge stored in the library and makes it the last-loaded one.
    ///
    /// # Errors
    ///
    /// `RomNotFound` if the library has no record with this id.
    pub fn load_from_library(&mut self, id: &str) -> Result<()> {
        let record = self.library.get(id)?;
        let name = record.meta.get("name").cloned().unwrap_or_else(|| id.to_string());
        let meta = CartridgeMeta {
            name,
            library_id: Some(id.to_string()),
        };
        self.load_cartridge(&record.data, meta)
    }

    /// Replaces the machine state with `bytes`; on error the state is unchanged.
    pub fn restore_snapshot(&mut self, bytes: &[u8]) -> Result<()> {
        let outcome = machine::lock(&self.machine).restore(bytes);
        match &outcome {
            Ok(()) => self.emit(StatusEvent::Restored),
            Err(error) => self.emit(StatusEvent::RestoreFailed {
                reason: error.to_string(),
            }),
        }
        outcome
    }

    /// Steps back one entry in the rewind ring and restores it.
    ///
    /// Returns `Ok(None)` when fewer than two entries exist.
    pub fn rewind(&mut self) -> Result<Option<RewindEntry>> {
        let Some(entry) = self.rewind.previous() else {
            self.emit(StatusEvent::NoPreviousSnapshot);
            return Ok(None);
        };
        self.restore_snapshot(&entry.payload)?;
        let _ = machine::lock(&self.machine).render();
        self.emit(StatusEvent::Rewound {
            id: entry.id.clone(),
        });
        Ok(Some(entry))
    }

    /// Returns the latest snapshot as a named artifact, or `None` if nothing was saved.
    ///
    /// The file is named after the loaded cartridge, else the entry's `rom` tag, else `save`.
    pub fn export_current(&self) -> Option<SaveArtifact> {
        let entry = self.rewind.latest()?;
        let loaded = machine::lock(&self.machine).cartridge().map(|c| c.name.clone());
        let name = loaded
            .or_else(|| entry.metadata.get("rom").cloned())
            .unwrap_or_else(|| "save".to_string());
        Some(SaveArtifact {
            filename: format!("{name}.sav"),
            bytes: entry.payload.to_vec(),
        })
    }

    /// Pushes an external save into the ring, tagged `imported=true`, then restores it.
    pub fn import_save(&mut self, bytes: Vec<u8>) -> Result<RewindEntry> {
        let mut meta = Metadata::new();
        let _ = meta.insert("imported".into(), "true".into());
        let entry = self.rewind.import_and_push(bytes, meta);
        self.restore_snapshot(&entry.payload)?;
        self.emit(StatusEvent::Imported {
            id: entry.id.clone(),
        });
        Ok(entry)
    }

    /// Resumes the previous session.
    ///
    /// Prefers the latest savestate; the last cartridge is installed first when nothing is
    /// loaded, since snapshots do not carry the cartridge image. Without a savestate the last
    /// cartridge is cold-started. Returns `None` when there is nothing to resume.
    pub fn restore_last_session(&mut self) -> Result<Option<ResumeSource>> {
        if let Some(entry) = self.rewind.latest() {
            let needs_cartridge = machine::lock(&self.machine).cartridge().is_none();
            if needs_cartridge {
                self.install_last_rom()?;
            }
            self.restore_snapshot(&entry.payload)?;
            let source = ResumeSource::Snapshot { id: entry.id };
            self.emit(StatusEvent::SessionResumed(source.clone()));
            return Ok(Some(source));
        }

        let Some(last) = self.library.last()? else {
            self.emit(StatusEvent::NothingToResume);
            return Ok(None);
        };
        match self.load_from_library(&last.id) {
            Ok(()) => {
                let source = ResumeSource::Cartridge { name: last.name };
                self.emit(StatusEvent::SessionResumed(source.clone()));
                Ok(Some(source))
            }
            Err(Error::RomNotFound(id)) => {
                tracing::warn!(%id, "last cartridge is no longer in the library");
                self.emit(StatusEvent::NothingToResume);
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Deletes every persisted save and the last-cartridge pointer; returns the saves deleted.
    pub fn clear_all_data(&mut self) -> Result<usize> {
        let deleted = self.rewind.clear_all()?;
        self.library.clear_last()?;
        self.emit(StatusEvent::Cleared { deleted });
        Ok(deleted)
    }

    /// Makes `engine` the active engine.
    ///
    /// # Errors
    ///
    /// `EngineBusy` while the scheduler is running.
    pub fn attach_engine(&mut self, engine: Box<dyn ExecutionEngine>) -> Result<()> {
        if self.scheduler.is_running() {
            return Err(Error::EngineBusy);
        }
        let name = engine.name().to_string();
        let _ = machine::lock(&self.machine).attach(engine);
        self.emit(StatusEvent::EngineAttached { name });
        Ok(())
    }

    /// Returns to the reference engine, handing back the external one.
    ///
    /// # Errors
    ///
    /// `EngineBusy` while the scheduler is running.
    pub fn detach_engine(&mut self) -> Result<Option<Box<dyn ExecutionEngine>>> {
        if self.scheduler.is_running() {
            return Err(Error::EngineBusy);
        }
        let engine = machine::lock(&self.machine).detach();
        if engine.is_some() {
            self.emit(StatusEvent::EngineDetached);
        }
        Ok(engine)
    }

    /// Starts the scheduler.
    pub fn start(&mut self) -> Result<()> {
        if self.scheduler.is_running() {
            return Ok(());
        }
        self.scheduler.start()?;
        self.emit(StatusEvent::Running);
        Ok(())
    }

    /// Pauses the scheduler.
    pub fn pause(&mut self) {
        if self.scheduler.is_running() {
            self.scheduler.pause();
            self.emit(StatusEvent::Paused);
        }
    }

    /// Executes one fetch-equivalent.
    pub fn step(&mut self) -> Result<u64> {
        self.scheduler.step_once()
    }

    /// Runs one tick.
    pub fn tick(&mut self) -> TickReport {
        self.scheduler.tick()
    }

    /// Ticks `frames` times at the configured frame rate.
    pub fn run(&mut self, frames: u64) -> u64 {
        self.scheduler.run(frames)
    }

    /// Sets the speed multiplier.
    pub fn set_speed(&mut self, multiplier: u32) -> Result<SpeedMultiplier> {
        let speed = self.scheduler.set_speed(multiplier)?;
        self.emit(StatusEvent::SpeedChanged(speed));
        Ok(speed)
    }

    /// Cycles to the next speed multiplier.
    pub fn toggle_speed(&mut self) -> SpeedMultiplier {
        let speed = self.scheduler.toggle_speed();
        self.emit(StatusEvent::SpeedChanged(speed));
        speed
    }

    /// Loads into the machine and leaves `Idle`, without snapshots or status.
    fn install(&mut self, bytes: &[u8], meta: &CartridgeMeta) -> Result<()> {
        machine::lock(&self.machine).load(bytes, meta)?;
        self.scheduler.mark_loaded();
        Ok(())
    }

    fn install_last_rom(&mut self) -> Result<()> {
        let Some(last) = self.library.last()? else {
            return Ok(());
        };
        match self.library.get(&last.id) {
            Ok(record) => {
                let meta = CartridgeMeta {
                    name: last.name,
                    library_id: Some(last.id),
                };
                self.install(&record.data, &meta)
            }
            Err(Error::RomNotFound(id)) => {
                tracing::warn!(%id, "last cartridge is no longer in the library");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    fn emit(&self, event: StatusEvent) {
        tracing::debug!(%event, "status");
        if let Some(sink) = &self.status {
            sink(&event);
        }
    }
}

impl std::fmt::Debug for Emulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emulator")
            .field("scheduler", &self.scheduler)
            .field("rewind", &self.rewind)
            .field("library", &self.library)
            .finish_non_exhaustive()
    }
}
