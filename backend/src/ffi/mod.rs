//! FFI boundary (PyO3)
//!
//! Minimal surface for embedding the engine in the Python platform: JSON
//! strings in, JSON strings out, using the stable request/response contract
//! from [`crate::api`].

pub mod engine;
