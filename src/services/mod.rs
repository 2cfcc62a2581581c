/// Session hydration from the local slot.
pub mod loader;
/// Score aggregation and final ranking.
pub mod scoring;
/// Finalize payload and submission flow.
pub mod submission;
/// Listing, claiming and leaving súmulas.
pub mod sumula_service;
