pub mod client;

pub use client::{AniListClient, ANILIST_URL};
