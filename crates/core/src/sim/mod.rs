//! Simulation driver.
//!
//! This module owns the running machine and everything that drives it over time:
//! 1. **Machine:** Reference engine plus the active backend, shared behind a mutex.
//! 2. **Scheduler:** Run state, speed, ticks and the auto-snapshot task.
//! 3. **Emulator:** The facade a host front-end talks to.
//! 4. **Loader and status:** Reading cartridge files and reporting outcomes to the host.

/// Host-facing facade.
pub mod emulator;
/// Cartridge file loading.
pub mod loader;
/// Machine ownership and engine dispatch.
pub mod machine;
/// Run loop and auto-snapshot task.
pub mod scheduler;
/// Status events.
pub mod status;

pub use emulator::{Emulator, SaveArtifact};
pub use machine::{Machine, SharedMachine};
pub use scheduler::{RunState, Scheduler, SpeedMultiplier, TickReport};
pub use status::{ResumeSource, StatusEvent, StatusSink};
