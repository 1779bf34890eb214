// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod episode_cache;
pub mod orchestrator;
pub mod progress_tracker;
pub mod range_partitioner;
pub mod reconciler;
pub mod settings_service;
pub mod title_resolver;


pub use episode_cache::EpisodeCache;

pub use orchestrator::{EpisodeEngine, EpisodeSession, SessionSnapshot};

pub use progress_tracker::ProgressTracker;

pub use range_partitioner::{partition, range_index_of};

pub use reconciler::{EpisodeReconciler, ReconcileHint};

pub use settings_service::SettingsService;

pub use title_resolver::{normalize_title, resolve_title, MatchTier, TitleMatch};
