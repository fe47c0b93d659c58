//! Deterministic random number generation
//!
//! Uses xorshift64* algorithm for fast, deterministic random number generation.
//! CRITICAL: All randomness in the engine MUST go through this module. Each
//! scenario owns its own `RngManager` seeded explicitly from configuration.

mod xorshift;

pub use xorshift::RngManager;
