// src/integrations/mod.rs
//
// External Integrations Module
//
// - http: shared transport + rate-limited fetcher
// - metadata / anilist: canonical counts and user progress
// - providers: streaming/scraping catalogue adapters

pub mod anilist;
pub mod http;
pub mod metadata;
pub mod providers;

pub use anilist::AniListClient;
pub use http::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, RateLimitedFetcher, ReqwestTransport,
    RetryPolicy,
};
pub use metadata::{CanonicalMedia, MetadataService};
pub use providers::{
    AnimePaheAdapter, GogoanimeAdapter, HiAnimeAdapter, ProviderAdapter, ProviderEndpoints,
    ProviderRegistry,
};
