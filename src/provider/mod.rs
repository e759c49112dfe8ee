//! Tile imagery provider module
//!
//! Defines the asynchronous fetcher abstraction, the HTTP implementation
//! backed by reqwest, and request-URL construction for the external
//! static-map provider contract.

mod http;
mod types;
mod url;

pub use http::{AsyncHttpClient, AsyncReqwestClient, HttpTileFetcher};
pub use types::{FetchError, MapStyle, TileFetcher};
pub use url::RequestUrlBuilder;

#[cfg(test)]
pub use http::tests::MockHttpClient;
