//! Reference execution engine.
//!
//! Fetches from the program counter and advances it by the fetch width of the current mode,
//! one cycle per fetch. Instruction decoding is out of scope: the fetched value is only kept
//! for inspection.

use super::engine::{CartridgeMeta, ExecutionEngine};
use super::regs::{FetchMode, MachineRegisters};
use crate::common::error::{Error, Result};
use crate::config::Config;
use crate::snapshot::{MachineStateSnapshot, SnapshotCodec, SnapshotLayout};
use crate::soc::{AddressSpace, MemoryBus};

/// Built-in engine owning the register file and the address space.
#[derive(Debug)]
pub struct ReferenceEngine {
    regs: MachineRegisters,
    mem: AddressSpace,
    codec: SnapshotCodec,
    entry_point: u32,
    halted: bool,
    cycles: u64,
    last_fetch: u32,
}

impl ReferenceEngine {
    /// Creates a halted engine over `mem`; `reset` or `load` starts it.
    ///
    /// # Arguments
    ///
    /// * `mem` - Address space the engine fetches from.
    /// * `entry_point` - Program counter after reset.
    pub fn new(mem: AddressSpace, entry_point: u32) -> Self {
        let codec = SnapshotCodec::new(SnapshotLayout::for_address_space(&mem));
        Self {
            regs: MachineRegisters::with_pc(entry_point),
            mem,
            codec,
            entry_point,
            halted: true,
            cycles: 0,
            last_fetch: 0,
        }
    }

    /// Builds the address space and engine described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mem = AddressSpace::from_config(&config.memory)?;
        Ok(Self::new(mem, config.engine.entry_point))
    }

    /// Returns the register file.
    pub const fn registers(&self) -> &MachineRegisters {
        &self.regs
    }

    /// Returns the register file mutably.
    pub fn registers_mut(&mut self) -> &mut MachineRegisters {
        &mut self.regs
    }

    /// Returns the address space.
    pub const fn memory(&self) -> &AddressSpace {
        &self.mem
    }

    /// Returns the address space mutably.
    pub fn memory_mut(&mut self) -> &mut AddressSpace {
        &mut self.mem
    }

    /// Returns the codec matching this engine's memory map.
    pub const fn codec(&self) -> &SnapshotCodec {
        &self.codec
    }

    /// Returns whether the engine is halted.
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Stops execution until the next reset.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    /// Returns the cycles executed since the last reset.
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Returns the value read by the most recent fetch.
    pub const fn last_fetch(&self) -> u32 {
        self.last_fetch
    }

    /// Captures registers and writable regions.
    pub fn capture(&self) -> MachineStateSnapshot {
        MachineStateSnapshot::capture(&self.regs, &self.mem)
    }

    /// Applies a decoded snapshot: registers first, then regions in layout order.
    ///
    /// Payloads are checked against the memory map before anything is written.
    pub fn apply(&mut self, snapshot: MachineStateSnapshot) -> Result<()> {
        for (index, payload) in snapshot.regions.iter().enumerate() {
            let fits = self
                .mem
                .region(payload.id)
                .is_some_and(|r| r.writable() && r.size() as usize == payload.bytes.len());
            if !fits {
                return Err(Error::SnapshotLayoutMismatch {
                    index,
                    reason: format!("no writable region {:?} of {} bytes", payload.id, payload.bytes.len()),
                });
            }
        }

        self.regs = snapshot.registers;
        for payload in snapshot.regions {
            if let Some(region) = self.mem.region_mut(payload.id) {
                region.restore(&payload.bytes)?;
            }
        }
        Ok(())
    }

    /// Performs one fetch; returns the cycles consumed (0 when halted).
    fn fetch(&mut self) -> u64 {
        if self.halted {
            return 0;
        }
        let pc = self.regs.pc;
        let mode = self.regs.mode();
        self.last_fetch = match mode {
            FetchMode::Full => self.mem.read_u32(pc),
            FetchMode::Compact => u32::from(self.mem.read_u16(pc)),
        };
        self.regs.pc = pc.wrapping_add(mode.width());
        self.cycles += 1;
        1
    }
}

impl ExecutionEngine for ReferenceEngine {
    fn name(&self) -> &str {
        "reference"
    }

    fn reset(&mut self) -> Result<()> {
        self.regs = MachineRegisters::with_pc(self.entry_point);
        self.halted = false;
        self.cycles = 0;
        self.last_fetch = 0;
        Ok(())
    }

    fn load(&mut self, cartridge: &[u8], meta: &CartridgeMeta) -> Result<()> {
        self.mem.load_cartridge(cartridge)?;
        tracing::info!(name = %meta.name, size = cartridge.len(), "cartridge loaded");
        self.reset()
    }

    fn advance(&mut self, cycle_budget: u64) -> Result<u64> {
        let mut executed = 0;
        while executed < cycle_budget && !self.halted {
            executed += self.fetch();
        }
        Ok(executed)
    }

    fn snapshot(&mut self) -> Result<Vec<u8>> {
        self.codec.encode(&self.capture())
    }

    fn restore(&mut self, bytes: &[u8]) -> Result<()> {
        let snapshot = self.codec.decode(bytes)?;
        self.apply(snapshot)
    }
}
