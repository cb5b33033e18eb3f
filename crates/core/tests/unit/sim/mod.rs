

/// End-to-end flows through the emulator facade.
pub mod session;

/// Status messages shown to the user.
pub mod status;
