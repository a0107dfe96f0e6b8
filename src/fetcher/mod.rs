pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

/// Largest feed body accepted, in bytes.
pub const MAX_FEED_SIZE: usize = 10 * 1024 * 1024;

/// Downloads the raw bytes of a feed document.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
