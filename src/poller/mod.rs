pub mod parser;

use std::sync::Arc;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::FeedSnapshot;
use crate::fetcher::Fetcher;

pub use parser::parse_feed;

/// Fetches and parses one source.
///
/// Implementations do not retry; the engine's next cycle is the retry.
#[async_trait]
pub trait FeedPoller: Send + Sync {
    async fn poll(&self, source_url: &str) -> Result<FeedSnapshot>;
}

/// Poller that downloads a feed and parses it with `feed-rs`.
pub struct RssPoller {
    fetcher: Arc<dyn Fetcher>,
}

impl RssPoller {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl FeedPoller for RssPoller {
    async fn poll(&self, source_url: &str) -> Result<FeedSnapshot> {
        let body = self.fetcher.fetch(source_url).await?;
        let snapshot = parse_feed(&body)?;
        tracing::debug!(
            source = source_url,
            headlines = snapshot.headlines.len(),
            "parsed feed"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::MirrorError;

    struct StaticFetcher(&'static str);

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl Fetcher for FailingFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            Err(MirrorError::FeedParse(format!("unreachable: {}", url)))
        }
    }

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
<item><title>One</title><pubDate>Thu, 01 Jan 1970 00:00:01 GMT</pubDate></item>
</channel></rss>"#;

    #[tokio::test]
    async fn test_poll_fetches_then_parses() {
        let poller = RssPoller::new(Arc::new(StaticFetcher(FEED)));
        let snapshot = poller.poll("https://example.com/rss").await.unwrap();

        assert_eq!(snapshot.publisher.title, Some("T".into()));
        assert_eq!(snapshot.headlines.len(), 1);
        assert_eq!(snapshot.headlines[0].published, "1000");
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let poller = RssPoller::new(Arc::new(FailingFetcher));
        assert!(poller.poll("https://example.com/rss").await.is_err());
    }

    #[tokio::test]
    async fn test_parse_failure_propagates() {
        let poller = RssPoller::new(Arc::new(StaticFetcher("not xml at all")));
        let err = poller.poll("https://example.com/rss").await.unwrap_err();
        assert!(matches!(err, MirrorError::FeedParse(_)));
    }
}
