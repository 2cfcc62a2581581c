/// Backend REST client.
pub mod api;
/// Local slot storage for the claimed súmula.
pub mod local_store;
/// Storage error types.
pub mod storage;
