use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::{MirrorError, Result};
use crate::fetcher::{Fetcher, MAX_FEED_SIZE};

const USER_AGENT: &str = concat!("feedmirror/", env!("CARGO_PKG_VERSION"));

pub struct HttpFetcher {
    client: Client,
    max_size: usize,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            max_size: MAX_FEED_SIZE,
        })
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        response.error_for_status_ref()?;

        if let Some(length) = response.content_length() {
            if length as usize > self.max_size {
                return Err(MirrorError::FeedTooLarge {
                    limit: self.max_size,
                });
            }
        }

        let body = response.bytes().await?;
        if body.len() > self.max_size {
            return Err(MirrorError::FeedTooLarge {
                limit: self.max_size,
            });
        }

        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    const BODY: &[u8] = b"<rss version=\"2.0\"><channel></channel></rss>";

    /// Answer a single request with `status` and `body`, then close.
    async fn serve_once(status: &'static str, body: &'static [u8], content_length: bool) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let mut head = format!("HTTP/1.1 {}\r\nContent-Type: application/rss+xml\r\n", status);
            if content_length {
                head.push_str(&format!("Content-Length: {}\r\n", body.len()));
            }
            head.push_str("Connection: close\r\n\r\n");

            // The client may hang up early once it has seen the headers.
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(body).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{}/feed.xml", addr)
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let url = serve_once("200 OK", BODY, true).await;
        let fetcher = HttpFetcher::new().unwrap();

        assert_eq!(fetcher.fetch(&url).await.unwrap(), BODY.to_vec());
    }

    #[tokio::test]
    async fn test_declared_length_over_limit_is_rejected() {
        let url = serve_once("200 OK", BODY, true).await;
        let fetcher = HttpFetcher::new().unwrap().with_max_size(8);

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, MirrorError::FeedTooLarge { limit: 8 }));
    }

    #[tokio::test]
    async fn test_undeclared_length_over_limit_is_rejected() {
        let url = serve_once("200 OK", BODY, false).await;
        let fetcher = HttpFetcher::new().unwrap().with_max_size(8);

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, MirrorError::FeedTooLarge { limit: 8 }));
    }

    #[tokio::test]
    async fn test_error_status_is_http_failure() {
        let url = serve_once("404 Not Found", b"", true).await;
        let fetcher = HttpFetcher::new().unwrap();

        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, MirrorError::Http(_)));
        assert_eq!(err.kind(), crate::app::FailureKind::FetchOrParse);
    }
}
