//! Wire shapes exchanged with the backend and persisted in the local slot.

/// Finalize request body.
pub mod finalize;
/// Active listing and claim bodies.
pub mod listing;
/// Súmula, player and pair shapes.
pub mod sumula;
/// Custom validator functions.
pub mod validation;
