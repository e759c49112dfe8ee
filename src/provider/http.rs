//! HTTP client abstraction for testability

use crate::provider::{FetchError, TileFetcher};
use image::{ImageReader, RgbaImage};
use std::future::Future;
use std::io::Cursor;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Default User-Agent string for HTTP requests.
/// Some tile servers reject requests without a User-Agent.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Trait for asynchronous HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP GET request.
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Async HTTP client implementation using reqwest.
///
/// Uses connection pooling and TCP keepalive to keep connections warm
/// across the many small requests a tile stream produces.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new AsyncReqwestClient with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(30)
    }

    /// Creates a new AsyncReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| FetchError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(FetchError::Http(format!("Request failed: {}", e)));
            }
        };

        if !response.status().is_success() {
            warn!(
                url = url,
                status = response.status().as_u16(),
                "HTTP error status"
            );
            return Err(FetchError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(bytes.to_vec())
            }
            Err(e) => {
                warn!(url = url, error = %e, "Failed to read response body");
                Err(FetchError::Http(format!("Failed to read response: {}", e)))
            }
        }
    }
}

/// Tile fetcher that GETs imagery over HTTP and decodes it to RGBA.
///
/// Generic over the HTTP client so tests can substitute a mock. Decode
/// failures are reported as [`FetchError::Decode`] and are non-fatal to
/// the caller, like any other fetch failure.
pub struct HttpTileFetcher<C: AsyncHttpClient> {
    client: C,
}

impl<C: AsyncHttpClient> HttpTileFetcher<C> {
    /// Creates a fetcher backed by the given HTTP client.
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

impl<C: AsyncHttpClient> TileFetcher for HttpTileFetcher<C> {
    async fn fetch(&self, url: &str) -> Result<RgbaImage, FetchError> {
        let start = Instant::now();
        let bytes = self.client.get(url).await?;

        let image = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| FetchError::Decode(format!("Format detection failed: {}", e)))?
            .decode()
            .map_err(|e| FetchError::Decode(format!("Decode failed: {}", e)))?
            .to_rgba8();

        debug!(
            url = url,
            width = image.width(),
            height = image.height(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tile image fetched"
        );

        Ok(image)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    /// Mock async HTTP client for testing
    #[derive(Clone)]
    pub struct MockHttpClient {
        pub response: Result<Vec<u8>, FetchError>,
    }

    impl AsyncHttpClient for MockHttpClient {
        async fn get(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            self.response.clone()
        }
    }

    fn encode_png(image: &RgbaImage) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, image::ImageFormat::Png)
            .expect("Failed to encode PNG");
        buffer.into_inner()
    }

    #[tokio::test]
    async fn test_fetch_decodes_image() {
        let source = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]));
        let fetcher = HttpTileFetcher::new(MockHttpClient {
            response: Ok(encode_png(&source)),
        });

        let image = fetcher.fetch("http://example.com/tile").await.unwrap();
        assert_eq!(image.dimensions(), (8, 8));
        assert_eq!(*image.get_pixel(4, 4), Rgba([10, 20, 30, 255]));
    }

    #[tokio::test]
    async fn test_fetch_http_error_propagates() {
        let fetcher = HttpTileFetcher::new(MockHttpClient {
            response: Err(FetchError::Http("HTTP 404".to_string())),
        });

        let result = fetcher.fetch("http://example.com/tile").await;
        assert!(matches!(result, Err(FetchError::Http(_))));
    }

    #[tokio::test]
    async fn test_fetch_garbage_payload_is_decode_error() {
        let fetcher = HttpTileFetcher::new(MockHttpClient {
            response: Ok(vec![0xde, 0xad, 0xbe, 0xef]),
        });

        let result = fetcher.fetch("http://example.com/tile").await;
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }
}
