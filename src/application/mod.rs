// src/application/mod.rs
//
// Application layer - host boundary
//
// CRITICAL RULES:
// - No business logic here
// - Wiring and configuration only

pub mod config;
pub mod state;

pub use config::{EngineConfig, StorageLocation};
pub use state::AppState;
