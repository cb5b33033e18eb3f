
/// Memory map validation.
pub mod builder;
