pub mod cache;
pub mod client;
pub mod http;
pub mod provider;
pub mod source;

use thiserror::Error;

pub use cache::{CacheStatus, CatalogCache};
pub use client::ResolverClient;
pub use http::HttpCatalogSource;
pub use provider::{MetadataRecord, PROVIDER_KEY, RemoteSearchResult};
pub use source::{CatalogSource, HealthPayload, HealthStatus, PlaybackInfo, PlaybackPayload};

/// Why a request to the resolver service failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("operation cancelled")]
    Cancelled,
    #[error("network error: {0}")]
    Network(String),
    #[error("resolver returned HTTP {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    Decode(String),
}

/// The caller cancelled the operation.
///
/// The only error the public client surfaces: fetch failures degrade to
/// cached or empty results instead.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("operation cancelled")]
pub struct Cancelled;
