// src/integrations/http/mod.rs
//
// Outbound HTTP shared by every integration.
//
// - `HttpTransport` is the single seam to the network (reqwest in production,
//   scripted responses in tests)
// - `RateLimitedFetcher` adds bounded exponential backoff on throttling

pub mod fetcher;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::{RateLimitedFetcher, RetryPolicy, ThrottleSignal};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
