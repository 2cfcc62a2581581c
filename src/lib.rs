//! Library crate for the súmula referee client, exposing the scoring session for
//! the console binary and integration tests.

/// Runtime configuration of the console.
pub mod config;
/// Backend client and local slot storage.
pub mod dao;
/// Wire and slot formats.
pub mod dto;
/// Operator-facing error types.
pub mod error;
/// Operations composing the session with the backend and the slot.
pub mod services;
/// Scoring session state.
pub mod state;
