//! Machine register file.
//!
//! Sixteen 32-bit general purpose registers, a status word and the program counter. The
//! fetch mode lives in the status word so that it travels with every snapshot.

use crate::common::constants::{
    FETCH_WIDTH_COMPACT, FETCH_WIDTH_FULL, GPR_COUNT, REGISTER_WORDS, STATUS_COMPACT_BIT,
};

/// Instruction fetch mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// 4-byte fetches.
    #[default]
    Full,
    /// 2-byte fetches.
    Compact,
}

impl FetchMode {
    /// Returns the number of bytes consumed by one fetch.
    pub const fn width(self) -> u32 {
        match self {
            Self::Full => FETCH_WIDTH_FULL,
            Self::Compact => FETCH_WIDTH_COMPACT,
        }
    }
}

/// Architectural register state owned by an execution engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MachineRegisters {
    /// General purpose registers `r0..r15`.
    pub gpr: [u32; GPR_COUNT],
    /// Status word; bit 5 selects the compact fetch mode.
    pub status: u32,
    /// Program counter.
    pub pc: u32,
}

impl MachineRegisters {
    /// Creates a zeroed register file with the given program counter.
    pub const fn with_pc(pc: u32) -> Self {
        Self {
            gpr: [0; GPR_COUNT],
            status: 0,
            pc,
        }
    }

    /// Reads a general purpose register; out-of-range indices read 0.
    pub fn read(&self, idx: usize) -> u32 {
        self.gpr.get(idx).copied().unwrap_or(0)
    }

    /// Writes a general purpose register; out-of-range indices are ignored.
    pub fn write(&mut self, idx: usize, val: u32) {
        if let Some(reg) = self.gpr.get_mut(idx) {
            *reg = val;
        }
    }

    /// Returns the current fetch mode.
    pub const fn mode(&self) -> FetchMode {
        if self.status & STATUS_COMPACT_BIT != 0 {
            FetchMode::Compact
        } else {
            FetchMode::Full
        }
    }

    /// Switches the fetch mode.
    pub fn set_mode(&mut self, mode: FetchMode) {
        match mode {
            FetchMode::Full => self.status &= !STATUS_COMPACT_BIT,
            FetchMode::Compact => self.status |= STATUS_COMPACT_BIT,
        }
    }

    /// Flattens the register file in snapshot order: `r0..r15`, status, pc.
    pub fn to_words(&self) -> [u32; REGISTER_WORDS] {
        let mut words = [0u32; REGISTER_WORDS];
        words[..GPR_COUNT].copy_from_slice(&self.gpr);
        words[GPR_COUNT] = self.status;
        words[GPR_COUNT + 1] = self.pc;
        words
    }

    /// Rebuilds a register file from snapshot order.
    pub fn from_words(words: &[u32; REGISTER_WORDS]) -> Self {
        let mut gpr = [0u32; GPR_COUNT];
        gpr.copy_from_slice(&words[..GPR_COUNT]);
        Self {
            gpr,
            status: words[GPR_COUNT],
            pc: words[GPR_COUNT + 1],
        }
    }

    /// Writes the register file to stderr.
    pub fn dump(&self) {
        for (i, chunk) in self.gpr.chunks(4).enumerate() {
            let base = i * 4;
            eprintln!(
                "r{:<2} {:#010x}  r{:<2} {:#010x}  r{:<2} {:#010x}  r{:<2} {:#010x}",
                base,
                chunk[0],
                base + 1,
                chunk[1],
                base + 2,
                chunk[2],
                base + 3,
                chunk[3]
            );
        }
        eprintln!("status {:#010x}  pc {:#010x}", self.status, self.pc);
    }
}
