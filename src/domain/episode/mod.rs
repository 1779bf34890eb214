pub mod entity;
pub mod invariants;

pub use entity::{
    AudioAvailability, AudioFlag, AudioType, Episode, EpisodeNumber, EpisodeSource, ProviderRef,
    RawEpisode,
};
pub use invariants::validate_episode;
